use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{config::load_settings, CourseStore, HttpCourseApi};
use shared::{
    domain::{CourseId, LessonId},
    protocol::Course,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "course-cli", about = "Inspect and edit courses through the course API")]
struct Cli {
    /// Overrides `api_base_url` from course_client.toml and the environment.
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load one course.
    Get { id: String },
    /// List all courses.
    List,
    Create {
        #[arg(long)]
        id: String,
        #[command(flatten)]
        fields: CourseFields,
    },
    /// Load a course, then patch the given fields.
    Update {
        id: String,
        #[command(flatten)]
        fields: CourseFields,
    },
    AddLesson { course_id: String, lesson_id: String },
}

#[derive(Args, Debug, Default, PartialEq)]
struct CourseFields {
    #[arg(long)]
    content_id: Option<String>,
    #[arg(long)]
    current_lesson_id: Option<String>,
    #[arg(long)]
    time_track: Option<f64>,
    #[arg(long)]
    done: Option<bool>,
    #[arg(long, value_delimiter = ',')]
    lessons: Option<Vec<String>>,
}

impl CourseFields {
    fn into_course(self, id: Option<CourseId>) -> Course {
        Course {
            id,
            content_id: self.content_id.map(Into::into),
            current_lesson_id: self.current_lesson_id.map(Into::into),
            time_track: self.time_track,
            done: self.done,
            lessons: self
                .lessons
                .map(|lessons| lessons.into_iter().map(LessonId::from).collect()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings();
    if let Some(api_url) = cli.api_url {
        settings.api_base_url = api_url;
    }
    info!(api_base_url = %settings.api_base_url, "using course api");

    let api = HttpCourseApi::from_settings(&settings)?;
    let store = CourseStore::new_with_api(Arc::new(api));

    match cli.command {
        Command::Get { id } => {
            store.get_course(&id.into()).await?;
            print_json(&store.course().await)?;
        }
        Command::List => {
            let courses = store.get_courses().await?;
            print_json(&courses)?;
        }
        Command::Create { id, fields } => {
            store
                .create_course(fields.into_course(Some(id.into())))
                .await?;
            print_json(&store.course().await)?;
        }
        Command::Update { id, fields } => {
            load_existing(&store, id.into()).await?;
            store.update_course(fields.into_course(None)).await?;
            print_json(&store.course().await)?;
        }
        Command::AddLesson {
            course_id,
            lesson_id,
        } => {
            load_existing(&store, course_id.into()).await?;
            store.update_course_lessons(lesson_id.into()).await?;
            print_json(&store.course().await)?;
        }
    }

    Ok(())
}

async fn load_existing(store: &CourseStore, id: CourseId) -> Result<()> {
    store.get_course(&id).await?;
    if store.course().await.is_none() {
        bail!("course {id} not found");
    }
    Ok(())
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render json")?;
    println!("{rendered}");
    Ok(())
}

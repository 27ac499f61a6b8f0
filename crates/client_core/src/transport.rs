use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    domain::CourseId,
    error::ApiError,
    protocol::{Course, CourseUpdate},
};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::config::ClientSettings;

const COURSE_PATH: &str = "course";

#[async_trait]
pub trait CourseApi: Send + Sync {
    /// `GET /course/{id}`. The API answers with a list even for a single id.
    async fn fetch_course(&self, id: &CourseId) -> Result<Vec<Course>>;
    /// `GET /course`.
    async fn list_courses(&self) -> Result<Vec<Course>>;
    /// `POST /course`.
    async fn create_course(&self, payload: &Course) -> Result<()>;
    /// `PATCH /course/{id}`.
    async fn patch_course(&self, id: &CourseId, update: &CourseUpdate) -> Result<()>;
}

pub struct MissingCourseApi;

#[async_trait]
impl CourseApi for MissingCourseApi {
    async fn fetch_course(&self, _id: &CourseId) -> Result<Vec<Course>> {
        Err(anyhow!("course api is unavailable"))
    }

    async fn list_courses(&self) -> Result<Vec<Course>> {
        Err(anyhow!("course api is unavailable"))
    }

    async fn create_course(&self, _payload: &Course) -> Result<()> {
        Err(anyhow!("course api is unavailable"))
    }

    async fn patch_course(&self, _id: &CourseId, _update: &CourseUpdate) -> Result<()> {
        Err(anyhow!("course api is unavailable"))
    }
}

pub struct HttpCourseApi {
    http: Client,
    base_url: Url,
}

impl HttpCourseApi {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = settings.request_timeout_secs.filter(|secs| *secs > 0) {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().context("failed to build http client")?;
        Self::with_client(http, &settings.api_base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid course api url '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("course api url '{base_url}' cannot be a base"));
        }
        Ok(Self { http, base_url })
    }

    fn course_url(&self, id: Option<&CourseId>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(COURSE_PATH);
            if let Some(id) = id {
                segments.push(id.as_str());
            }
        }
        url
    }
}

#[async_trait]
impl CourseApi for HttpCourseApi {
    async fn fetch_course(&self, id: &CourseId) -> Result<Vec<Course>> {
        let url = self.course_url(Some(id));
        debug!(%url, "fetching course");
        let response = check_status(self.http.get(url).send().await?).await?;
        decode_course_list(response).await
    }

    async fn list_courses(&self) -> Result<Vec<Course>> {
        let url = self.course_url(None);
        debug!(%url, "listing courses");
        let response = check_status(self.http.get(url).send().await?).await?;
        decode_course_list(response).await
    }

    async fn create_course(&self, payload: &Course) -> Result<()> {
        let url = self.course_url(None);
        debug!(%url, "creating course");
        check_status(self.http.post(url).json(payload).send().await?).await?;
        Ok(())
    }

    async fn patch_course(&self, id: &CourseId, update: &CourseUpdate) -> Result<()> {
        let url = self.course_url(Some(id));
        debug!(%url, "patching course");
        check_status(self.http.patch(url).json(update).send().await?).await?;
        Ok(())
    }
}

/// Message of an error body whose `code` this client does not know.
#[derive(Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Prefers the server's error message over the bare status error.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let err = response.error_for_status_ref().err();
    let body = response.bytes().await.unwrap_or_default();
    if let Ok(api_error) = serde_json::from_slice::<ApiError>(&body) {
        return Err(api_error.into());
    }
    if let Ok(body) = serde_json::from_slice::<ErrorMessage>(&body) {
        return Err(anyhow!(body.message));
    }
    match err {
        Some(err) => Err(err.into()),
        None => Err(anyhow!("course api responded with status {status}")),
    }
}

/// A `null` body is treated as an empty list.
async fn decode_course_list(response: Response) -> Result<Vec<Course>> {
    let body = response.bytes().await?;
    let courses: Option<Vec<Course>> =
        serde_json::from_slice(&body).context("malformed course list response")?;
    Ok(courses.unwrap_or_default())
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;

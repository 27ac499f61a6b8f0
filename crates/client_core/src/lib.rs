use std::{collections::HashSet, sync::Arc};

use shared::{
    domain::{CourseId, LessonId},
    protocol::{Course, CourseUpdate},
};
use tokio::sync::Mutex;
use tracing::{info, warn};

pub mod config;
pub mod error;
pub mod transport;

pub use error::StoreError;
pub use transport::{CourseApi, HttpCourseApi, MissingCourseApi};

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseStoreState {
    /// The currently active course.
    pub course: Option<Course>,
    /// The last fetched course list; `None` until `get_courses` succeeds.
    pub courses: Option<Vec<Course>>,
}

/// Session-scoped course state backed by a [`CourseApi`].
///
/// Mutating operations apply their change locally first and revert it if the
/// remote call fails. The state lock is never held across a remote call, so
/// concurrent operations on the same course are not serialized.
pub struct CourseStore {
    api: Arc<dyn CourseApi>,
    inner: Mutex<CourseStoreState>,
}

impl CourseStore {
    pub fn new() -> Arc<Self> {
        Self::new_with_api(Arc::new(MissingCourseApi))
    }

    pub fn new_with_api(api: Arc<dyn CourseApi>) -> Arc<Self> {
        Arc::new(Self {
            api,
            inner: Mutex::new(CourseStoreState::default()),
        })
    }

    pub async fn state(&self) -> CourseStoreState {
        self.inner.lock().await.clone()
    }

    pub async fn course(&self) -> Option<Course> {
        self.inner.lock().await.course.clone()
    }

    pub async fn courses(&self) -> Option<Vec<Course>> {
        self.inner.lock().await.courses.clone()
    }

    pub async fn is_enrolled(&self) -> bool {
        self.inner
            .lock()
            .await
            .course
            .as_ref()
            .is_some_and(Course::is_enrolled)
    }

    pub async fn get_course(&self, id: &CourseId) -> Result<()> {
        if id.as_str().is_empty() {
            return Err(StoreError::InvalidInput("course id must not be empty"));
        }

        let courses = self
            .api
            .fetch_course(id)
            .await
            .map_err(StoreError::transport)?;
        let course = courses.into_iter().next();
        if course.is_none() {
            info!(course_id = %id, "course not found");
        }

        self.inner.lock().await.course = course;
        Ok(())
    }

    pub async fn get_courses(&self) -> Result<Vec<Course>> {
        let courses = self
            .api
            .list_courses()
            .await
            .map_err(StoreError::transport)?;

        self.inner.lock().await.courses = Some(courses.clone());
        Ok(courses)
    }

    pub async fn create_course(&self, payload: Course) -> Result<()> {
        self.inner.lock().await.course = Some(payload.clone());

        if let Err(err) = self.api.create_course(&payload).await {
            self.inner.lock().await.course = None;
            warn!("create course failed, cleared optimistic course: {err:#}");
            return Err(StoreError::transport(err));
        }
        Ok(())
    }

    /// Does nothing when no course is loaded.
    pub async fn update_course(&self, payload: Course) -> Result<()> {
        let (snapshot, course_id) = {
            let mut guard = self.inner.lock().await;
            let Some(current) = guard.course.as_ref() else {
                return Ok(());
            };
            let merged = current.merged_with(&payload);
            let course_id = merged.id.clone().ok_or(StoreError::MissingCourseId)?;
            let snapshot = guard.course.replace(merged);
            (snapshot, course_id)
        };

        let update = CourseUpdate::Fields(payload);
        if let Err(err) = self.api.patch_course(&course_id, &update).await {
            self.inner.lock().await.course = snapshot;
            warn!(course_id = %course_id, "update course failed, restored snapshot: {err:#}");
            return Err(StoreError::transport(err));
        }
        Ok(())
    }

    pub async fn update_course_lessons(&self, lesson_id: LessonId) -> Result<()> {
        let (course_id, lessons, added, had_lessons) = {
            let mut guard = self.inner.lock().await;
            let course = guard.course.as_mut().ok_or(StoreError::NoCourseLoaded)?;
            let course_id = course.id.clone().ok_or(StoreError::MissingCourseId)?;
            let had_lessons = course.lessons.is_some();
            let mut lessons = unique_lessons(course.lessons.as_deref().unwrap_or_default());
            let added = !lessons.contains(&lesson_id);
            if added {
                lessons.push(lesson_id.clone());
            }
            course.lessons = Some(lessons.clone());
            (course_id, lessons, added, had_lessons)
        };

        let update = CourseUpdate::Lessons {
            lessons: lessons.clone(),
        };
        if let Err(err) = self.api.patch_course(&course_id, &update).await {
            let mut lessons = lessons;
            if added {
                lessons.retain(|lesson| lesson != &lesson_id);
            }
            if let Some(course) = self.inner.lock().await.course.as_mut() {
                course.lessons = (had_lessons || !lessons.is_empty()).then_some(lessons);
            }
            warn!(
                course_id = %course_id,
                lesson_id = %lesson_id,
                "append lesson failed, rolled back lesson list: {err:#}"
            );
            return Err(StoreError::transport(err));
        }
        Ok(())
    }
}

/// Drops repeated ids, keeping the first occurrence of each.
fn unique_lessons(lessons: &[LessonId]) -> Vec<LessonId> {
    let mut seen = HashSet::with_capacity(lessons.len());
    lessons
        .iter()
        .filter(|lesson| seen.insert(*lesson))
        .cloned()
        .collect()
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

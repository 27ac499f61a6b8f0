use serde::{Deserialize, Serialize};

use crate::domain::{ContentId, CourseId, LessonId};

/// A course resource as exchanged with the course API.
///
/// Every field is optional so the same shape is used for full records and
/// for partial create/update payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Course {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CourseId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<ContentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_lesson_id: Option<LessonId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_track: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lessons: Option<Vec<LessonId>>,
}

impl Course {
    pub fn with_id(id: impl Into<CourseId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Shallow merge: every field set in `patch` replaces the same field here.
    pub fn merged_with(&self, patch: &Course) -> Course {
        Course {
            id: patch.id.clone().or_else(|| self.id.clone()),
            content_id: patch.content_id.clone().or_else(|| self.content_id.clone()),
            current_lesson_id: patch
                .current_lesson_id
                .clone()
                .or_else(|| self.current_lesson_id.clone()),
            time_track: patch.time_track.or(self.time_track),
            done: patch.done.or(self.done),
            lessons: patch.lessons.clone().or_else(|| self.lessons.clone()),
        }
    }

    pub fn is_enrolled(&self) -> bool {
        self.content_id.is_some()
    }
}

/// Body of `PATCH /course/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CourseUpdate {
    Lessons { lessons: Vec<LessonId> },
    Fields(Course),
}

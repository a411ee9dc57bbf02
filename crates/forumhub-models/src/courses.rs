//! Course records.
//!
//! A course is identified by its name. Names are compared exactly: `"Java"`,
//! `"java"` and `"Java "` are three different courses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::ids::CourseId;

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct Course {
    pub id: CourseId,
    #[schema(example = "Python")]
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The slice of a course embedded in a topic.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct CourseSummary {
    pub id: CourseId,
    pub name: String,
}

impl From<&Course> for CourseSummary {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id,
            name: course.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    pub name: String,
    pub description: Option<String>,
}

impl NewCourse {
    /// A course created on first use by a topic: just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

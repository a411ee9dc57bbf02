//! Topic records, the assembled topic view and the topic request DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::courses::CourseSummary;
use crate::ids::{CourseId, TopicId, UserId};

/// A topic row as stored, with bare foreign keys.
#[derive(FromRow, Debug, Clone, PartialEq, Eq)]
pub struct TopicRecord {
    pub id: TopicId,
    pub title: String,
    pub message: String,
    pub author_id: UserId,
    pub course_id: CourseId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct AuthorSummary {
    pub id: UserId,
    pub username: String,
}

/// A topic with its author and course resolved.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct Topic {
    pub id: TopicId,
    #[schema(example = "How do generics work?")]
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: AuthorSummary,
    pub course: CourseSummary,
}

#[derive(Debug, Clone)]
pub struct NewTopic {
    pub title: String,
    pub message: String,
    pub author_id: UserId,
    pub course_id: CourseId,
}

/// Fields to overwrite on an existing topic. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicChanges {
    pub title: Option<String>,
    pub message: Option<String>,
    pub course_id: Option<CourseId>,
}

impl TopicChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.message.is_none() && self.course_id.is_none()
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTopicRequest {
    #[validate(length(min = 5, max = 200, message = "title must be between 5 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 10, message = "message must be at least 10 characters"))]
    pub message: String,
    #[validate(length(min = 2, max = 100, message = "course_name must be between 2 and 100 characters"))]
    #[schema(example = "Python")]
    pub course_name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTopicRequest {
    #[validate(length(min = 5, max = 200, message = "title must be between 5 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 10, message = "message must be at least 10 characters"))]
    pub message: Option<String>,
    #[validate(length(min = 2, max = 100, message = "course_name must be between 2 and 100 characters"))]
    pub course_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TopicResponse {
    pub message: String,
    pub topic: Topic,
}

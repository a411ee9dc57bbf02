//! # Forum Hub Models
//!
//! Domain entities and request/response DTOs.
//!
//! - [`ids`]: typed identifiers for users, courses and topics
//! - [`auth`]: registration and login payloads
//! - [`users`]: user records and credentials
//! - [`courses`]: course records
//! - [`topics`]: topic records, the assembled topic view, and topic payloads
//!
//! Request DTOs carry the boundary validation table as `validator`
//! attributes; services receive them already checked.

pub mod auth;
pub mod courses;
pub mod ids;
pub mod topics;
pub mod users;

pub use auth::{AuthResponse, CurrentUserResponse, LoginRequest, MessageResponse, RegisterRequest};
pub use courses::{Course, CourseSummary, NewCourse};
pub use ids::{CourseId, TopicId, UserId};
pub use topics::{
    AuthorSummary, CreateTopicRequest, NewTopic, Topic, TopicChanges, TopicRecord, TopicResponse,
    UpdateTopicRequest,
};
pub use users::{NewUser, User, UserCredentials};

use axum::{Json, extract::State};
use tracing::instrument;

use forumhub_core::AppError;
use forumhub_models::Course;

use crate::state::AppState;

use super::service::CourseService;

/// List all courses, ordered by name
#[utoipa::path(
    get,
    path = "/api/courses",
    responses(
        (status = 200, description = "All courses", body = Vec<Course>)
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, AppError> {
    let courses = CourseService::list(state.courses.as_ref()).await?;
    Ok(Json(courses))
}

use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::list_courses;

pub fn init_courses_router() -> Router<AppState> {
    Router::new().route("/", get(list_courses))
}

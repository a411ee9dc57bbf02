use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{create_topic, delete_topic, get_topic, list_topics, update_topic};

pub fn init_topics_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_topic).get(list_topics))
        .route(
            "/{id}",
            get(get_topic).put(update_topic).delete(delete_topic),
        )
}

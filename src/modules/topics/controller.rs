use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use forumhub_core::AppError;
use forumhub_models::{
    CreateTopicRequest, MessageResponse, Topic, TopicId, TopicResponse, UpdateTopicRequest,
};

use crate::middleware::auth::AuthUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::TopicService;

#[utoipa::path(
    get,
    path = "/api/topics",
    responses(
        (status = 200, description = "All topics, newest first", body = Vec<Topic>)
    ),
    tag = "Topics"
)]
#[instrument(skip(state))]
pub async fn list_topics(State(state): State<AppState>) -> Result<Json<Vec<Topic>>, AppError> {
    let topics = TopicService::list(&state).await?;
    Ok(Json(topics))
}

#[utoipa::path(
    get,
    path = "/api/topics/{id}",
    params(("id" = String, Path, description = "Topic ID")),
    responses(
        (status = 200, description = "Topic found", body = Topic),
        (status = 404, description = "Topic not found", body = ErrorResponse)
    ),
    tag = "Topics"
)]
#[instrument(skip(state))]
pub async fn get_topic(
    State(state): State<AppState>,
    Path(id): Path<TopicId>,
) -> Result<Json<Topic>, AppError> {
    let topic = TopicService::get(&state, id).await?;
    Ok(Json(topic))
}

#[utoipa::path(
    post,
    path = "/api/topics",
    request_body = CreateTopicRequest,
    responses(
        (status = 201, description = "Topic created", body = TopicResponse),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Topics",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto), fields(user_id = %auth_user.user_id()))]
pub async fn create_topic(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateTopicRequest>,
) -> Result<(StatusCode, Json<TopicResponse>), AppError> {
    let topic = TopicService::create(&state, auth_user.user_id(), dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(TopicResponse {
            message: "Topic created successfully".to_string(),
            topic,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/topics/{id}",
    params(("id" = String, Path, description = "Topic ID")),
    request_body = UpdateTopicRequest,
    responses(
        (status = 200, description = "Topic updated", body = TopicResponse),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorResponse),
        (status = 403, description = "Not the topic's author", body = ErrorResponse),
        (status = 404, description = "Topic not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Topics",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto), fields(user_id = %auth_user.user_id()))]
pub async fn update_topic(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<TopicId>,
    ValidatedJson(dto): ValidatedJson<UpdateTopicRequest>,
) -> Result<Json<TopicResponse>, AppError> {
    let topic = TopicService::update(&state, auth_user.user_id(), id, dto).await?;

    Ok(Json(TopicResponse {
        message: "Topic updated successfully".to_string(),
        topic,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/topics/{id}",
    params(("id" = String, Path, description = "Topic ID")),
    responses(
        (status = 200, description = "Topic deleted", body = MessageResponse),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorResponse),
        (status = 403, description = "Not the topic's author", body = ErrorResponse),
        (status = 404, description = "Topic not found", body = ErrorResponse)
    ),
    tag = "Topics",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn delete_topic(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<TopicId>,
) -> Result<Json<MessageResponse>, AppError> {
    TopicService::delete(&state, auth_user.user_id(), id).await?;

    Ok(Json(MessageResponse {
        message: "Topic deleted successfully".to_string(),
    }))
}

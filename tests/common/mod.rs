use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use forumhub::forumhub_config::{CorsConfig, JwtConfig};
use forumhub::router::init_router;
use forumhub::state::AppState;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-characters-long";

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: TEST_SECRET.to_string(),
        access_token_expiry: 24 * 60 * 60,
    }
}

/// Router over a fresh in-memory store. The state is returned so tests can
/// inspect storage directly.
pub fn setup_test_app() -> (Router, AppState) {
    let state = AppState::in_memory(
        test_jwt_config(),
        CorsConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
    );
    (init_router(state.clone(), None), state)
}

/// Sends one request and returns the status with the body parsed as JSON
/// (`Value::Null` when the body is empty or not JSON).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, body)
}

/// Registers a user and returns the access token and the user object.
#[allow(dead_code)]
pub async fn register(app: &Router, username: &str, email: &str, password: &str) -> (String, Value) {
    let (status, body) = send(
        app,
        "POST",
        "/api/register",
        None,
        Some(json!({
            "username": username,
            "email": email,
            "password": password
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);

    let token = body["access_token"].as_str().unwrap().to_string();
    (token, body["user"].clone())
}

/// Creates a topic and returns the topic object.
#[allow(dead_code)]
pub async fn create_topic(app: &Router, token: &str, title: &str, course_name: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/topics",
        Some(token),
        Some(json!({
            "title": title,
            "message": "A long enough message",
            "course_name": course_name
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "topic creation failed: {}", body);

    body["topic"].clone()
}

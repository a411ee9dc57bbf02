use axum::http::{HeaderValue, Method, header};
use axum::{Json, Router, middleware, routing::get};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::{metrics_middleware, metrics_router};
use crate::modules::auth::init_auth_router;
use crate::modules::courses::init_courses_router;
use crate::modules::topics::init_topics_router;
use crate::state::AppState;

/// Builds the application router. `/metrics` is mounted only when a
/// Prometheus handle is supplied.
pub fn init_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let cors = {
        let allowed_origins: Vec<HeaderValue> = state
            .cors_config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(allowed_origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .allow_credentials(true)
    };

    let mut router = Router::new()
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .nest(
            "/api",
            Router::new()
                .merge(init_auth_router())
                .nest("/topics", init_topics_router())
                .nest("/courses", init_courses_router()),
        )
        .with_state(state);

    if let Some(handle) = metrics_handle {
        router = router.merge(metrics_router(handle));
    }

    router
        .layer(cors)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}

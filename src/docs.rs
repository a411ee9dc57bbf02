use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use forumhub_models::{
    AuthResponse, AuthorSummary, Course, CourseSummary, CreateTopicRequest, CurrentUserResponse,
    LoginRequest, MessageResponse, RegisterRequest, Topic, TopicResponse, UpdateTopicRequest,
    User,
};

use crate::modules::auth::controller::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register_user,
        crate::modules::auth::controller::login_user,
        crate::modules::auth::controller::get_current_user,
        crate::modules::topics::controller::list_topics,
        crate::modules::topics::controller::get_topic,
        crate::modules::topics::controller::create_topic,
        crate::modules::topics::controller::update_topic,
        crate::modules::topics::controller::delete_topic,
        crate::modules::courses::controller::list_courses,
    ),
    components(
        schemas(
            User,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            CurrentUserResponse,
            MessageResponse,
            ErrorResponse,
            Course,
            CourseSummary,
            AuthorSummary,
            Topic,
            CreateTopicRequest,
            UpdateTopicRequest,
            TopicResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and the current user"),
        (name = "Topics", description = "Discussion topics"),
        (name = "Courses", description = "Courses topics are filed under")
    ),
    info(
        title = "Forum Hub API",
        version = "0.1.0",
        description = "Forum backend built with Rust, Axum, and PostgreSQL featuring JWT-based authentication.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

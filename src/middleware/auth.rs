use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use forumhub_auth::{Claims, verify_token};
use forumhub_core::{AppError, AuthError};
use forumhub_models::UserId;

use crate::state::AppState;

/// Extractor that validates the bearer token and provides the caller's claims.
///
/// Rejects with 401: `Authorization token required` when the header is
/// absent, `Invalid token` when it is not a well-formed, correctly signed
/// bearer token, and `Token expired` once the token has lapsed.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> UserId {
        UserId::from_uuid(self.0.sub)
    }

    pub fn username(&self) -> &str {
        &self.0.username
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::TokenMissing)?
        .to_str()
        .map_err(|_| AuthError::TokenInvalid)?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::TokenInvalid)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

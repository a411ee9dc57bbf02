//! Access token issuing and verification.
//!
//! Tokens are HS256 JWTs signed with [`JwtConfig::secret`]. Expiry is not left
//! to `jsonwebtoken`'s clock and leeway: it is compared against an explicit
//! `now` with no grace period, so a token is valid for exactly
//! [`JwtConfig::access_token_expiry`] seconds after issuance.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use forumhub_config::JwtConfig;
use forumhub_core::{AuthError, ForumError};

use crate::claims::Claims;

/// Issues an access token for `user_id`, valid from now.
pub fn create_access_token(
    user_id: Uuid,
    username: &str,
    jwt_config: &JwtConfig,
) -> Result<String, ForumError> {
    create_access_token_at(user_id, username, Utc::now(), jwt_config)
}

/// Issues an access token as if the current time were `issued_at`.
pub fn create_access_token_at(
    user_id: Uuid,
    username: &str,
    issued_at: DateTime<Utc>,
    jwt_config: &JwtConfig,
) -> Result<String, ForumError> {
    let iat = issued_at.timestamp();
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: iat + jwt_config.access_token_expiry,
        iat,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| ForumError::internal(format!("Failed to create token: {}", e)))
}

/// Verifies a token against the current time.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AuthError> {
    verify_token_at(token, Utc::now(), jwt_config)
}

/// Verifies signature and structure, then checks expiry against `now`.
///
/// # Errors
///
/// - [`AuthError::TokenInvalid`] for a malformed token, a bad signature or a
///   payload that does not match [`Claims`]
/// - [`AuthError::TokenExpired`] once `now` reaches `exp`
pub fn verify_token_at(
    token: &str,
    now: DateTime<Utc>,
    jwt_config: &JwtConfig,
) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::TokenInvalid)?;

    if now.timestamp() >= claims.exp {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims)
}

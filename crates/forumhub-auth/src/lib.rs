//! # Forum Hub Auth
//!
//! Identity tokens for the Forum Hub API.
//!
//! - [`claims`]: the JWT payload
//! - [`jwt`]: issuing and verifying access tokens
//!
//! Verification is pure: it needs the signing secret from
//! [`JwtConfig`](forumhub_config::JwtConfig) and nothing else, so it never
//! touches storage.
//!
//! # Example
//!
//! ```ignore
//! use forumhub_auth::{create_access_token, verify_token};
//! use forumhub_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, "alice", &config)?;
//! let claims = verify_token(&token, &config)?;
//! assert_eq!(claims.sub, user_id);
//! ```

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::{create_access_token, create_access_token_at, verify_token, verify_token_at};

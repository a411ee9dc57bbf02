//! # Forum Hub Core
//!
//! Foundational types shared by every other crate in the workspace:
//!
//! - [`errors`]: the typed domain error ([`ForumError`]) and the HTTP boundary
//!   error ([`AppError`]) it is rendered through
//! - [`password`]: password hashing and verification
//!
//! # Example
//!
//! ```ignore
//! use forumhub_core::{ForumError, hash_password, verify_password};
//!
//! let digest = hash_password("secret1")?;
//! if !verify_password("secret1", &digest)? {
//!     return Err(ForumError::Auth(AuthError::InvalidCredentials));
//! }
//! ```

pub mod errors;
pub mod password;

pub use errors::{AppError, AuthError, ForumError, ForumResult};
pub use password::{hash_password, verify_password};

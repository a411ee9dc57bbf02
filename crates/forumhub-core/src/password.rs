use bcrypt::{DEFAULT_COST, hash, verify};

use crate::errors::ForumError;

pub fn hash_password(password: &str) -> Result<String, ForumError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| ForumError::internal(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, digest: &str) -> Result<bool, ForumError> {
    verify(password, digest)
        .map_err(|e| ForumError::internal(format!("Failed to verify password: {}", e)))
}

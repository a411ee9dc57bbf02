use tracing::{info, instrument, warn};

use forumhub_auth::create_access_token;
use forumhub_config::JwtConfig;
use forumhub_core::{AuthError, ForumError, ForumResult, hash_password, verify_password};
use forumhub_db::UserRepository;
use forumhub_models::{AuthResponse, LoginRequest, NewUser, RegisterRequest, User, UserId};

use crate::metrics;

pub struct AuthService;

impl AuthService {
    #[instrument(skip(users, dto, jwt_config), fields(username = %dto.username))]
    pub async fn register(
        users: &dyn UserRepository,
        dto: RegisterRequest,
        jwt_config: &JwtConfig,
    ) -> ForumResult<AuthResponse> {
        let password_hash = hash_password(&dto.password)?;

        let user = users
            .create(NewUser {
                username: dto.username,
                email: dto.email,
                password_hash,
            })
            .await?;

        let access_token = create_access_token(user.id.into_inner(), &user.username, jwt_config)?;

        metrics::track_user_registered();
        info!(user_id = %user.id, "User registered");

        Ok(AuthResponse {
            message: "User registered successfully".to_string(),
            access_token,
            user,
        })
    }

    /// Unknown usernames and wrong passwords fail identically.
    #[instrument(skip(users, dto, jwt_config), fields(username = %dto.username))]
    pub async fn login(
        users: &dyn UserRepository,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> ForumResult<AuthResponse> {
        let Some(credentials) = users.find_credentials(&dto.username).await? else {
            metrics::track_user_login_failure();
            warn!("Login failed: unknown username");
            return Err(AuthError::InvalidCredentials.into());
        };

        if !verify_password(&dto.password, &credentials.password_hash)? {
            metrics::track_user_login_failure();
            warn!(user_id = %credentials.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let user = credentials.into_user();
        let access_token = create_access_token(user.id.into_inner(), &user.username, jwt_config)?;

        metrics::track_user_login_success();

        Ok(AuthResponse {
            message: "Login successful".to_string(),
            access_token,
            user,
        })
    }

    #[instrument(skip(users))]
    pub async fn current_user(users: &dyn UserRepository, user_id: UserId) -> ForumResult<User> {
        users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ForumError::not_found("User not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forumhub_auth::verify_token;
    use forumhub_db::MemoryStore;

    fn get_test_jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 24 * 60 * 60,
        }
    }

    fn register_dto(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryStore::new();
        let config = get_test_jwt_config();

        let registered = AuthService::register(&store, register_dto("alice", "a@x.com"), &config)
            .await
            .unwrap();
        assert_eq!(registered.user.username, "alice");

        let claims = verify_token(&registered.access_token, &config).unwrap();
        assert_eq!(claims.sub, registered.user.id.into_inner());

        let logged_in = AuthService::login(
            &store,
            LoginRequest {
                username: "alice".to_string(),
                password: "secret1".to_string(),
            },
            &config,
        )
        .await
        .unwrap();
        assert_eq!(logged_in.user, registered.user);
    }

    #[tokio::test]
    async fn test_register_duplicate_username_regardless_of_email() {
        let store = MemoryStore::new();
        let config = get_test_jwt_config();

        AuthService::register(&store, register_dto("alice", "a@x.com"), &config)
            .await
            .unwrap();
        let err = AuthService::register(&store, register_dto("alice", "b@x.com"), &config)
            .await
            .unwrap_err();

        assert!(matches!(err, ForumError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let store = MemoryStore::new();
        let config = get_test_jwt_config();
        AuthService::register(&store, register_dto("alice", "a@x.com"), &config)
            .await
            .unwrap();

        let err = AuthService::login(
            &store,
            LoginRequest {
                username: "alice".to_string(),
                password: "wrong-password".to_string(),
            },
            &config,
        )
        .await
        .unwrap_err();

        assert_eq!(err, ForumError::Auth(AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let store = MemoryStore::new();

        let err = AuthService::login(
            &store,
            LoginRequest {
                username: "nobody".to_string(),
                password: "secret1".to_string(),
            },
            &get_test_jwt_config(),
        )
        .await
        .unwrap_err();

        assert_eq!(err, ForumError::Auth(AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_current_user_not_found() {
        let store = MemoryStore::new();
        let err = AuthService::current_user(&store, UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ForumError::NotFound(_)));
    }
}

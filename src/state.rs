use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use forumhub_config::{AppConfig, CorsConfig, JwtConfig};
use forumhub_db::{
    CourseRepository, MemoryStore, PgStore, TopicRepository, UserRepository, default_courses,
    init_db_pool, run_migrations,
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub courses: Arc<dyn CourseRepository>,
    pub topics: Arc<dyn TopicRepository>,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
}

impl AppState {
    /// Builds the state around one store that backs all three repositories.
    pub fn with_store<S>(store: Arc<S>, jwt_config: JwtConfig, cors_config: CorsConfig) -> Self
    where
        S: UserRepository + CourseRepository + TopicRepository + 'static,
    {
        Self {
            users: store.clone(),
            courses: store.clone(),
            topics: store,
            jwt_config,
            cors_config,
        }
    }

    pub fn in_memory(jwt_config: JwtConfig, cors_config: CorsConfig) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), jwt_config, cors_config)
    }
}

/// Connects to PostgreSQL when `DATABASE_URL` is set, otherwise falls back to
/// a seeded in-memory store.
pub async fn init_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    match &config.database.url {
        Some(url) => {
            let pool = init_db_pool(&config.database, url)
                .await
                .context("Failed to connect to database")?;
            run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            info!(
                max_connections = config.database.max_connections,
                "Connected to PostgreSQL"
            );

            Ok(AppState::with_store(
                Arc::new(PgStore::new(pool)),
                config.jwt.clone(),
                config.cors.clone(),
            ))
        }
        None => {
            warn!("DATABASE_URL is not set; using the in-memory store, data will not persist");

            let store = Arc::new(MemoryStore::new());
            if CourseRepository::list(&*store).await?.is_empty() {
                let seeded = store.seed(&default_courses()).await?;
                info!(seeded, "Seeded default courses");
            }

            Ok(AppState::with_store(
                store,
                config.jwt.clone(),
                config.cors.clone(),
            ))
        }
    }
}

//! # Forum Hub DB
//!
//! Storage for the Forum Hub API.
//!
//! - [`ports`]: the repository traits services are written against
//! - [`postgres`]: [`PgStore`], the sqlx/PostgreSQL implementation
//! - [`memory`]: [`MemoryStore`], an in-process implementation with the same
//!   uniqueness and locking rules, used by tests and database-less runs
//! - [`seed`]: the default course catalogue
//!
//! # Example
//!
//! ```ignore
//! use forumhub_config::DatabaseConfig;
//! use forumhub_db::{PgStore, init_db_pool, run_migrations};
//!
//! let pool = init_db_pool(&config, &url).await?;
//! run_migrations(&pool).await?;
//! let store = PgStore::new(pool);
//! ```

pub mod memory;
pub mod ports;
pub mod postgres;
pub mod seed;

use forumhub_config::DatabaseConfig;
use sqlx::postgres::PgPoolOptions;

pub use memory::MemoryStore;
pub use ports::{CourseRepository, TopicGuard, TopicRepository, UserRepository};
pub use postgres::PgStore;
pub use seed::default_courses;

// Re-export PgPool for convenience
pub use sqlx::PgPool;

/// Opens a PostgreSQL connection pool sized from `config`.
pub async fn init_db_pool(config: &DatabaseConfig, database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(database_url)
        .await
}

/// Applies the embedded migrations under `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

//! # Forum Hub Config
//!
//! Configuration types for the Forum Hub API.
//!
//! Every structure is loaded from environment variables once, at process
//! start, and then handed to the components that need it. Nothing here is
//! mutated after construction.
//!
//! - [`jwt`]: token signing secret and lifetime
//! - [`cors`]: allowed browser origins
//! - [`server`]: listen address
//! - [`database`]: PostgreSQL connection settings
//!
//! # Example
//!
//! ```ignore
//! use forumhub_config::AppConfig;
//!
//! dotenvy::dotenv().ok();
//! let config = AppConfig::from_env();
//! println!("listening on {}", config.server.bind_address());
//! ```

pub mod cors;
pub mod database;
pub mod jwt;
pub mod server;

pub use cors::CorsConfig;
pub use database::DatabaseConfig;
pub use jwt::JwtConfig;
pub use server::ServerConfig;

/// Every configuration section the application needs, built in one place.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub jwt: JwtConfig,
    pub cors: CorsConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            jwt: JwtConfig::from_env(),
            cors: CorsConfig::from_env(),
            server: ServerConfig::from_env(),
            database: DatabaseConfig::from_env(),
        }
    }
}

use clap::{Parser, Subcommand};
use dotenvy::dotenv;

use forumhub_config::DatabaseConfig;
use forumhub_db::{CourseRepository, PgPool, PgStore, default_courses, init_db_pool, run_migrations};

#[derive(Parser)]
#[command(name = "forumhub-cli")]
#[command(about = "Forum Hub CLI - Administrative tools for Forum Hub", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Insert the default course catalogue, skipping courses that already exist
    SeedCourses,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();
    let config = DatabaseConfig::from_env();

    let Some(database_url) = config.url.as_deref() else {
        eprintln!("❌ DATABASE_URL must be set");
        std::process::exit(1);
    };

    let pool = match init_db_pool(&config, database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("❌ Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Migrate => handle_migrate(&pool).await,
        Commands::SeedCourses => handle_seed_courses(pool).await,
    }
}

async fn handle_migrate(pool: &PgPool) {
    match run_migrations(pool).await {
        Ok(()) => println!("✅ Migrations applied"),
        Err(e) => {
            eprintln!("❌ Error applying migrations: {}", e);
            std::process::exit(1);
        }
    }
}

async fn handle_seed_courses(pool: PgPool) {
    let store = PgStore::new(pool);
    let courses = default_courses();

    match store.seed(&courses).await {
        Ok(inserted) => {
            println!("✅ Seeded {} course(s)", inserted);
            let skipped = courses.len() as u64 - inserted;
            if skipped > 0 {
                println!("   {} already existed", skipped);
            }
        }
        Err(e) => {
            eprintln!("❌ Error seeding courses: {}", e);
            std::process::exit(1);
        }
    }
}

pub mod models;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;

pub type DbPool = Pool<Sqlite>;

pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    // Create the database file if it doesn't exist
    if database_url.starts_with("sqlite:") {
        let db_path = database_url.strip_prefix("sqlite:").unwrap();
        if !Path::new(db_path).exists() {
            if let Some(parent) = Path::new(db_path).parent() {
                std::fs::create_dir_all(parent).ok();
            }
            std::fs::File::create(db_path).ok();
        }
    }

    // Clubs/courts/loyalty tiers are external collaborators referenced by
    // opaque id; they are never populated locally, so leave sqlx's default
    // foreign-key enforcement off to match that model.
    let options = SqliteConnectOptions::from_str(database_url)?.foreign_keys(false);
    SqlitePool::connect_with(options).await
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    let migration_sql = include_str!("migrations/001_initial_schema.sql");

    sqlx::raw_sql(migration_sql).execute(pool).await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}

//! Application state for the annotext API.

use anyhow::Result;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub struct AppState {
    pub db: SqlitePool,
}

impl AppState {
    pub async fn new() -> Result<Self> {
        let db_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:annotext.db?mode=rwc".to_string());

        tracing::info!("Connecting to database: {}", db_url);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, running migrations. Used by tests with an
    /// in-memory database.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        run_migrations(&pool).await?;
        Ok(Self { db: pool })
    }
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    tracing::info!("Running database migrations...");

    // One row per parsed document, keyed by filename.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS docs (
            filename TEXT PRIMARY KEY,
            data TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Settings blob, one row per allow-listed key.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Migrations complete");
    Ok(())
}

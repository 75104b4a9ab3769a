use anyhow::{Context, Result, anyhow};
use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use std::time::Duration;
use tracing::info;

// Embed migrations into the binary
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/");

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Build the shared r2d2 pool. Connections are checked out per store call
/// and returned to the pool when dropped.
pub fn build_pool(database_url: &str, max_size: u32) -> Result<PgPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(max_size)
        .connection_timeout(Duration::from_secs(10))
        .build(manager)
        .context("Failed to create database connection pool")?;

    info!("Database pool ready (max_size={})", max_size);
    Ok(pool)
}

/// Apply any pending embedded migrations, returning how many ran
pub async fn run_migrations(pool: &PgPool) -> Result<usize> {
    let pool = pool.clone();

    let applied = tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .context("Failed to get database connection for migrations")?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow!("Failed to run database migrations: {e}"))?;
        Ok::<usize, anyhow::Error>(applied.len())
    })
    .await
    .context("Migration task panicked")??;

    if applied > 0 {
        info!("Applied {} database migration(s)", applied);
    } else {
        info!("Database schema is up to date");
    }
    Ok(applied)
}

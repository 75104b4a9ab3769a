use anyhow::Result;
use tracing::info;

use airspace_intel::db::{PgPool, run_migrations};

pub async fn handle_migrate(pool: &PgPool) -> Result<()> {
    info!("Running database migrations...");
    let applied = run_migrations(pool).await?;
    info!("Migrations complete ({} applied)", applied);
    Ok(())
}

use anyhow::{Context, Result};
use tracing::info;

use airspace_intel::pings::Ping;
use airspace_intel::store::Store;

/// Write a ping row and read back the total, as a connectivity smoke test
pub async fn handle_ping(store: &dyn Store, message: String) -> Result<i64> {
    let ping = Ping::new(message);
    store
        .insert_ping(&ping)
        .await
        .context("Failed to insert ping")?;

    let count = store.count_pings().await.context("Failed to count pings")?;
    info!("Inserted ping {} ({} total)", ping.id, count);
    Ok(count)
}

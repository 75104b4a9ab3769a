use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

use airspace_intel::health::{HealthService, SystemStatus};
use airspace_intel::store::Store;

/// Run the aggregate health check and print a one-screen summary
pub async fn handle_status(store: Arc<dyn Store>) -> Result<SystemStatus> {
    let health = HealthService::new(store);
    let check = health.check().await;
    let status = SystemStatus::from_check(&check);

    match &check {
        Ok(snapshot) => {
            println!("Status:        {}", status);
            println!("DB:            connected");
            println!("Pings:         {}", snapshot.ping_count);
            println!("Observations:  {}", snapshot.obs_count);
            match &snapshot.latest_obs {
                Some(obs) => println!(
                    "Latest obs:    {} ({})",
                    obs.observed_at.to_rfc3339(),
                    obs.aircraft.label()
                ),
                None => println!("Latest obs:    -"),
            }
            match &snapshot.last_run {
                Some(run) => {
                    println!("Last run:      {} {}", run.id, run.status);
                    println!("  started:     {}", run.started_at.to_rfc3339());
                    println!(
                        "  finished:    {}",
                        run.finished_at
                            .map(|t| t.to_rfc3339())
                            .unwrap_or_else(|| "-".to_string())
                    );
                    println!("  message:     {}", run.message.as_deref().unwrap_or("-"));
                }
                None => println!("Last run:      -"),
            }
            info!("Health check complete: {}", status);
        }
        Err(e) => {
            println!("Status:        {}", status);
            println!("DB:            error ({})", e);
            error!("Health check failed: {}", e);
        }
    }

    Ok(status)
}

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use tracing::{error, info};

use airspace_intel::ingest::{DemoAircraft, IngestError, run_ingest};
use airspace_intel::store::Store;

/// Run a single ingest and report the outcome.
///
/// Errors are returned to `main`, which logs them and exits non-zero.
pub async fn handle_ingest(store: &dyn Store, demo: &DemoAircraft) -> Result<()> {
    info!(
        service = "worker",
        time = %Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "worker alive"
    );

    match run_ingest(store, demo).await {
        Ok(result) => {
            info!(
                "Ingest run {} finished with status {}: {}",
                result.run.id,
                result.run.status,
                result.run.message.as_deref().unwrap_or("")
            );
            Ok(())
        }
        Err(e) => {
            if let IngestError::Failed {
                close_error: Some(close_error),
                run_id,
                ..
            } = &e
            {
                error!(
                    "Ingest run {} could not be closed and is still RUNNING: {}",
                    run_id, close_error
                );
            }
            Err(e.into())
        }
    }
}

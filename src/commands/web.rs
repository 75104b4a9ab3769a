use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

use airspace_intel::store::Store;
use airspace_intel::web::start_web_server;

pub async fn handle_web(interface: String, port: u16, store: Arc<dyn Store>) -> Result<()> {
    if airspace_intel::metrics::init_metrics().is_some() {
        airspace_intel::metrics::initialize_ingest_metrics();
        let metrics_task = tokio::spawn(airspace_intel::metrics::process_metrics_task());
        tokio::spawn(async move {
            if let Err(e) = metrics_task.await {
                error!("Process metrics task panicked: {}", e);
            }
        });
        info!("Prometheus metrics available at /metrics");
    }

    start_web_server(interface, port, store).await
}

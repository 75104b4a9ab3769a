//! Read-side health aggregation
//!
//! All queries are side-effect free. The aggregate `check` issues its reads
//! concurrently, so its counts and "latest" rows are each consistent on their
//! own but may come from slightly different moments.

use serde::Serialize;
use std::sync::Arc;

use crate::error::StoreError;
use crate::ingest_runs::{IngestRun, IngestRunStatus};
use crate::observations::ObservationView;
use crate::store::Store;

/// Page size of the recent-observations listing
pub const DEFAULT_RECENT_LIMIT: i64 = 20;

/// Aggregate read of everything the dashboard shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub ping_count: i64,
    pub obs_count: i64,
    pub latest_obs: Option<ObservationView>,
    pub last_run: Option<IngestRun>,
}

/// Overall state derived from a health check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SystemStatus {
    Ok,
    Attn,
}

impl SystemStatus {
    /// OK only when the database answered and the last run is either still
    /// running or succeeded
    pub fn derive(db_connected: bool, last_run_status: Option<IngestRunStatus>) -> Self {
        let run_ok = matches!(
            last_run_status,
            Some(IngestRunStatus::Success) | Some(IngestRunStatus::Running)
        );
        if db_connected && run_ok {
            SystemStatus::Ok
        } else {
            SystemStatus::Attn
        }
    }

    pub fn from_check(check: &Result<HealthSnapshot, StoreError>) -> Self {
        match check {
            Ok(snapshot) => {
                Self::derive(true, snapshot.last_run.as_ref().map(|run| run.status))
            }
            Err(_) => SystemStatus::Attn,
        }
    }
}

impl std::fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SystemStatus::Ok => write!(f, "OK"),
            SystemStatus::Attn => write!(f, "ATTN"),
        }
    }
}

#[derive(Clone)]
pub struct HealthService {
    store: Arc<dyn Store>,
}

impl HealthService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn count_pings(&self) -> Result<i64, StoreError> {
        self.store.count_pings().await
    }

    pub async fn count_observations(&self) -> Result<i64, StoreError> {
        self.store.count_observations().await
    }

    pub async fn latest_observation(&self) -> Result<Option<ObservationView>, StoreError> {
        self.store.latest_observation().await
    }

    pub async fn latest_ingest_run(&self) -> Result<Option<IngestRun>, StoreError> {
        self.store.latest_ingest_run().await
    }

    /// Newest observations first; `None` means the default page size
    pub async fn recent_observations(
        &self,
        limit: Option<i64>,
    ) -> Result<Vec<ObservationView>, StoreError> {
        let limit = limit.unwrap_or(DEFAULT_RECENT_LIMIT).max(0);
        self.store.recent_observations(limit).await
    }

    /// Compose every health read. Any failing read fails the whole check so
    /// callers never see a partial aggregate.
    #[tracing::instrument(skip(self))]
    pub async fn check(&self) -> Result<HealthSnapshot, StoreError> {
        let (ping_count, obs_count, latest_obs, last_run) = tokio::try_join!(
            self.count_pings(),
            self.count_observations(),
            self.latest_observation(),
            self.latest_ingest_run(),
        )?;

        Ok(HealthSnapshot {
            ping_count,
            obs_count,
            latest_obs,
            last_run,
        })
    }
}

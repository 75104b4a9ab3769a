//! The store seam shared by the ingest runner and the health queries
//!
//! Callers receive the store explicitly (`&dyn Store` or `Arc<dyn Store>`);
//! there is no global client. `PgStore` is the PostgreSQL implementation,
//! `MemoryStore` is an in-process substitute used by tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::aircraft::{Aircraft, AircraftUpsert, normalize_icao24};
use crate::aircraft_repo::AircraftRepository;
use crate::db::PgPool;
use crate::error::StoreError;
use crate::ingest_runs::{IngestRun, RunOutcome};
use crate::ingest_runs_repo::IngestRunsRepository;
use crate::observations::{NewObservation, Observation, ObservationView};
use crate::observations_repo::ObservationsRepository;
use crate::pings::Ping;
use crate::pings_repo::PingsRepository;

/// Every operation is a single, independently committed unit of work.
#[async_trait]
pub trait Store: Send + Sync {
    async fn count_pings(&self) -> Result<i64, StoreError>;

    async fn insert_ping(&self, ping: &Ping) -> Result<(), StoreError>;

    async fn count_observations(&self) -> Result<i64, StoreError>;

    /// Newest observation by `observed_at`, or `None` if there are none
    async fn latest_observation(&self) -> Result<Option<ObservationView>, StoreError>;

    /// Up to `limit` observations, newest first
    async fn recent_observations(&self, limit: i64) -> Result<Vec<ObservationView>, StoreError>;

    async fn insert_observation(
        &self,
        observation: NewObservation,
    ) -> Result<Observation, StoreError>;

    async fn upsert_aircraft(&self, aircraft: AircraftUpsert) -> Result<Aircraft, StoreError>;

    async fn count_aircraft(&self) -> Result<i64, StoreError>;

    async fn find_aircraft(&self, icao24: &str) -> Result<Option<Aircraft>, StoreError>;

    /// Newest run by `started_at`, or `None` if no run was ever opened
    async fn latest_ingest_run(&self) -> Result<Option<IngestRun>, StoreError>;

    async fn get_ingest_run(&self, run_id: Uuid) -> Result<Option<IngestRun>, StoreError>;

    /// Open a run in the `Running` state
    async fn create_ingest_run(&self, started_at: DateTime<Utc>) -> Result<IngestRun, StoreError>;

    /// Apply the single terminal transition of a run
    async fn finish_ingest_run(
        &self,
        run_id: Uuid,
        outcome: RunOutcome,
        finished_at: DateTime<Utc>,
    ) -> Result<IngestRun, StoreError>;
}

/// PostgreSQL-backed store composed from the per-table repositories
#[derive(Clone)]
pub struct PgStore {
    aircraft: AircraftRepository,
    observations: ObservationsRepository,
    ingest_runs: IngestRunsRepository,
    pings: PingsRepository,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            aircraft: AircraftRepository::new(pool.clone()),
            observations: ObservationsRepository::new(pool.clone()),
            ingest_runs: IngestRunsRepository::new(pool.clone()),
            pings: PingsRepository::new(pool),
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn count_pings(&self) -> Result<i64, StoreError> {
        self.pings.count().await
    }

    async fn insert_ping(&self, ping: &Ping) -> Result<(), StoreError> {
        self.pings.insert(ping).await
    }

    async fn count_observations(&self) -> Result<i64, StoreError> {
        self.observations.count().await
    }

    async fn latest_observation(&self) -> Result<Option<ObservationView>, StoreError> {
        self.observations.get_latest().await
    }

    async fn recent_observations(&self, limit: i64) -> Result<Vec<ObservationView>, StoreError> {
        self.observations.get_recent(limit).await
    }

    async fn insert_observation(
        &self,
        observation: NewObservation,
    ) -> Result<Observation, StoreError> {
        self.observations.insert(observation).await
    }

    async fn upsert_aircraft(&self, aircraft: AircraftUpsert) -> Result<Aircraft, StoreError> {
        self.aircraft.upsert(aircraft).await
    }

    async fn count_aircraft(&self) -> Result<i64, StoreError> {
        self.aircraft.count().await
    }

    async fn find_aircraft(&self, icao24: &str) -> Result<Option<Aircraft>, StoreError> {
        let icao24 = normalize_icao24(icao24)?;
        self.aircraft.get_by_icao24(&icao24).await
    }

    async fn latest_ingest_run(&self) -> Result<Option<IngestRun>, StoreError> {
        self.ingest_runs.get_latest().await
    }

    async fn get_ingest_run(&self, run_id: Uuid) -> Result<Option<IngestRun>, StoreError> {
        self.ingest_runs.get_by_id(run_id).await
    }

    async fn create_ingest_run(&self, started_at: DateTime<Utc>) -> Result<IngestRun, StoreError> {
        self.ingest_runs.create(started_at).await
    }

    async fn finish_ingest_run(
        &self,
        run_id: Uuid,
        outcome: RunOutcome,
        finished_at: DateTime<Utc>,
    ) -> Result<IngestRun, StoreError> {
        self.ingest_runs.finish(run_id, outcome, finished_at).await
    }
}

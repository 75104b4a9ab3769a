//! In-process `Store` implementation
//!
//! Mirrors the PostgreSQL semantics that matter to callers: icao24 uniqueness
//! with callsign overwrite, foreign keys from observations, newest-first
//! ordering with id tie-breaks, and the single terminal transition of a run.
//! Individual operations can be made to fail to exercise error paths.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::aircraft::{Aircraft, AircraftRef, AircraftUpsert, normalize_icao24};
use crate::error::StoreError;
use crate::ingest_runs::{IngestRun, RunOutcome};
use crate::observations::{NewObservation, Observation, ObservationView};
use crate::pings::Ping;
use crate::store::Store;

/// Store operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    CountPings,
    InsertPing,
    CountObservations,
    LatestObservation,
    RecentObservations,
    InsertObservation,
    UpsertAircraft,
    CountAircraft,
    FindAircraft,
    LatestIngestRun,
    GetIngestRun,
    CreateIngestRun,
    FinishIngestRun,
}

#[derive(Default)]
struct MemoryState {
    aircraft: Vec<Aircraft>,
    observations: Vec<Observation>,
    ingest_runs: Vec<IngestRun>,
    pings: Vec<Ping>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    failures: Mutex<HashMap<FailPoint, StoreError>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call of `point` fail with `error` until cleared
    pub async fn fail(&self, point: FailPoint, error: StoreError) {
        self.failures.lock().await.insert(point, error);
    }

    pub async fn clear_failure(&self, point: FailPoint) {
        self.failures.lock().await.remove(&point);
    }

    /// Snapshot of every run, oldest first
    pub async fn ingest_runs(&self) -> Vec<IngestRun> {
        self.state.lock().await.ingest_runs.clone()
    }

    async fn check(&self, point: FailPoint) -> Result<(), StoreError> {
        match self.failures.lock().await.get(&point) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl MemoryState {
    fn view(&self, observation: &Observation) -> Option<ObservationView> {
        self.aircraft
            .iter()
            .find(|a| a.id == observation.aircraft_id)
            .map(|a| ObservationView::new(observation, AircraftRef::from(a)))
    }

    fn recent(&self, limit: usize) -> Vec<ObservationView> {
        let mut sorted: Vec<&Observation> = self.observations.iter().collect();
        sorted.sort_by(|a, b| {
            b.observed_at
                .cmp(&a.observed_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        sorted
            .into_iter()
            .filter_map(|o| self.view(o))
            .take(limit)
            .collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn count_pings(&self) -> Result<i64, StoreError> {
        self.check(FailPoint::CountPings).await?;
        Ok(self.state.lock().await.pings.len() as i64)
    }

    async fn insert_ping(&self, ping: &Ping) -> Result<(), StoreError> {
        self.check(FailPoint::InsertPing).await?;
        self.state.lock().await.pings.push(ping.clone());
        Ok(())
    }

    async fn count_observations(&self) -> Result<i64, StoreError> {
        self.check(FailPoint::CountObservations).await?;
        Ok(self.state.lock().await.observations.len() as i64)
    }

    async fn latest_observation(&self) -> Result<Option<ObservationView>, StoreError> {
        self.check(FailPoint::LatestObservation).await?;
        Ok(self.state.lock().await.recent(1).into_iter().next())
    }

    async fn recent_observations(&self, limit: i64) -> Result<Vec<ObservationView>, StoreError> {
        self.check(FailPoint::RecentObservations).await?;
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        Ok(self.state.lock().await.recent(limit))
    }

    async fn insert_observation(
        &self,
        observation: NewObservation,
    ) -> Result<Observation, StoreError> {
        self.check(FailPoint::InsertObservation).await?;
        let mut state = self.state.lock().await;

        if !state.aircraft.iter().any(|a| a.id == observation.aircraft_id) {
            return Err(StoreError::Constraint {
                constraint: Some("observations_aircraft_id_fkey".to_string()),
                message: format!("aircraft {} does not exist", observation.aircraft_id),
            });
        }
        if let Some(run_id) = observation.ingest_run_id
            && !state.ingest_runs.iter().any(|r| r.id == run_id)
        {
            return Err(StoreError::Constraint {
                constraint: Some("observations_ingest_run_id_fkey".to_string()),
                message: format!("ingest run {run_id} does not exist"),
            });
        }

        let stored = observation.into_observation();
        state.observations.push(stored.clone());
        Ok(stored)
    }

    async fn upsert_aircraft(&self, upsert: AircraftUpsert) -> Result<Aircraft, StoreError> {
        self.check(FailPoint::UpsertAircraft).await?;
        let mut state = self.state.lock().await;
        let now = Utc::now();

        if let Some(existing) = state
            .aircraft
            .iter_mut()
            .find(|a| a.icao24 == upsert.icao24)
        {
            existing.callsign = upsert.callsign;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let created = Aircraft {
            id: Uuid::now_v7(),
            icao24: upsert.icao24,
            callsign: upsert.callsign,
            created_at: now,
            updated_at: now,
        };
        state.aircraft.push(created.clone());
        Ok(created)
    }

    async fn count_aircraft(&self) -> Result<i64, StoreError> {
        self.check(FailPoint::CountAircraft).await?;
        Ok(self.state.lock().await.aircraft.len() as i64)
    }

    async fn find_aircraft(&self, icao24: &str) -> Result<Option<Aircraft>, StoreError> {
        self.check(FailPoint::FindAircraft).await?;
        let icao24 = normalize_icao24(icao24)?;
        let state = self.state.lock().await;
        Ok(state.aircraft.iter().find(|a| a.icao24 == icao24).cloned())
    }

    async fn latest_ingest_run(&self) -> Result<Option<IngestRun>, StoreError> {
        self.check(FailPoint::LatestIngestRun).await?;
        let state = self.state.lock().await;
        Ok(state
            .ingest_runs
            .iter()
            .max_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id)))
            .cloned())
    }

    async fn get_ingest_run(&self, run_id: Uuid) -> Result<Option<IngestRun>, StoreError> {
        self.check(FailPoint::GetIngestRun).await?;
        let state = self.state.lock().await;
        Ok(state.ingest_runs.iter().find(|r| r.id == run_id).cloned())
    }

    async fn create_ingest_run(&self, started_at: DateTime<Utc>) -> Result<IngestRun, StoreError> {
        self.check(FailPoint::CreateIngestRun).await?;
        let run = IngestRun::start(started_at);
        self.state.lock().await.ingest_runs.push(run.clone());
        Ok(run)
    }

    async fn finish_ingest_run(
        &self,
        run_id: Uuid,
        outcome: RunOutcome,
        finished_at: DateTime<Utc>,
    ) -> Result<IngestRun, StoreError> {
        self.check(FailPoint::FinishIngestRun).await?;
        let mut state = self.state.lock().await;
        let run = state
            .ingest_runs
            .iter_mut()
            .find(|r| r.id == run_id)
            .ok_or_else(|| StoreError::not_found("ingest run", run_id))?;

        run.finish(&outcome, finished_at)?;
        Ok(run.clone())
    }
}

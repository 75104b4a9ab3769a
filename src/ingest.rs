//! One-shot ingest runner
//!
//! A run is opened (and committed) before any observation is written, so a
//! crash mid-run leaves a visible `RUNNING` row. Every failure after that point
//! closes the run as `FAILED` with the error text before being returned.

use chrono::{DateTime, Utc};
use rand::RngExt;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::aircraft::{Aircraft, AircraftUpsert};
use crate::error::StoreError;
use crate::ingest_runs::{IngestRun, RunOutcome};
use crate::observations::{NewObservation, Observation};
use crate::store::Store;

/// A synthetic position report to be written by a run
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSample {
    pub icao24: String,
    pub callsign: Option<String>,
    pub observed_at: DateTime<Utc>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub altitude_m: Option<f64>,
    pub ground_speed_ms: Option<f64>,
}

/// Aircraft used for the demo sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoAircraft {
    pub icao24: String,
    pub callsign: Option<String>,
}

impl Default for DemoAircraft {
    fn default() -> Self {
        Self {
            icao24: "40621B".to_string(),
            callsign: Some("BAW123".to_string()),
        }
    }
}

impl DemoAircraft {
    /// One sample near London Heathrow with a little positional jitter
    pub fn sample(&self, observed_at: DateTime<Utc>) -> SyntheticSample {
        let mut rng = rand::rng();
        SyntheticSample {
            icao24: self.icao24.clone(),
            callsign: self.callsign.clone(),
            observed_at,
            lat: Some(51.4700 + rng.random_range(-0.05..0.05)),
            lon: Some(-0.4543 + rng.random_range(-0.05..0.05)),
            altitude_m: Some(rng.random_range(900.0..1500.0_f64).round()),
            ground_speed_ms: Some(rng.random_range(110.0..140.0_f64).round()),
        }
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunResult {
    /// The run in its terminal `SUCCESS` state
    pub run: IngestRun,
    pub aircraft: Vec<Aircraft>,
    pub observations: Vec<Observation>,
    /// Total observation count read back after the writes
    pub total_observations: i64,
}

#[derive(Debug, Error)]
pub enum IngestError {
    /// The run record itself could not be created; nothing else was written
    #[error("failed to open ingest run")]
    Open(#[source] StoreError),

    /// A write failed after the run was opened. `close_error` is set when the
    /// run could not be marked `FAILED` either.
    #[error("ingest run {run_id} failed")]
    Failed {
        run_id: Uuid,
        #[source]
        source: StoreError,
        close_error: Option<StoreError>,
    },
}

impl IngestError {
    pub fn run_id(&self) -> Option<Uuid> {
        match self {
            IngestError::Open(_) => None,
            IngestError::Failed { run_id, .. } => Some(*run_id),
        }
    }

    /// The store error that caused the run to fail
    pub fn cause(&self) -> &StoreError {
        match self {
            IngestError::Open(source) => source,
            IngestError::Failed { source, .. } => source,
        }
    }
}

/// Message recorded on a successful run
pub fn success_message(written: usize, total: i64) -> String {
    format!("ok: wrote {written} observation(s); total observations = {total}")
}

pub struct IngestRunner<'a> {
    store: &'a dyn Store,
}

impl<'a> IngestRunner<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Execute one run over `samples`
    #[tracing::instrument(skip(self, samples), fields(samples = samples.len()))]
    pub async fn run(&self, samples: &[SyntheticSample]) -> Result<RunResult, IngestError> {
        let start = Instant::now();

        let run = self
            .store
            .create_ingest_run(Utc::now())
            .await
            .map_err(|e| {
                error!("Failed to open ingest run: {}", e);
                metrics::counter!("ingest.runs.open_failed", "kind" => e.kind()).increment(1);
                IngestError::Open(e)
            })?;
        metrics::counter!("ingest.runs.started").increment(1);
        info!("Opened ingest run {}", run.id);

        match self.write_samples(run.id, samples).await {
            Ok((aircraft, observations, total_observations)) => {
                let outcome =
                    RunOutcome::success(success_message(observations.len(), total_observations));
                let run = match self
                    .store
                    .finish_ingest_run(run.id, outcome, Utc::now())
                    .await
                {
                    Ok(run) => run,
                    Err(e) => return Err(self.fail(run.id, e).await),
                };

                metrics::counter!("ingest.runs.succeeded").increment(1);
                metrics::counter!("ingest.observations.written")
                    .increment(observations.len() as u64);
                metrics::histogram!("ingest.run.duration_seconds")
                    .record(start.elapsed().as_secs_f64());
                info!(
                    "Ingest run {} succeeded: {} observation(s) written, {} total",
                    run.id,
                    observations.len(),
                    total_observations
                );

                Ok(RunResult {
                    run,
                    aircraft,
                    observations,
                    total_observations,
                })
            }
            Err(e) => Err(self.fail(run.id, e).await),
        }
    }

    async fn write_samples(
        &self,
        run_id: Uuid,
        samples: &[SyntheticSample],
    ) -> Result<(Vec<Aircraft>, Vec<Observation>, i64), StoreError> {
        let mut aircraft = Vec::with_capacity(samples.len());
        let mut observations = Vec::with_capacity(samples.len());

        for sample in samples {
            let upsert = AircraftUpsert::new(&sample.icao24, sample.callsign.as_deref())?;
            let stored = self.store.upsert_aircraft(upsert).await?;

            let observation = self
                .store
                .insert_observation(NewObservation {
                    aircraft_id: stored.id,
                    ingest_run_id: Some(run_id),
                    observed_at: sample.observed_at,
                    lat: sample.lat,
                    lon: sample.lon,
                    altitude_m: sample.altitude_m,
                    ground_speed_ms: sample.ground_speed_ms,
                })
                .await?;

            aircraft.push(stored);
            observations.push(observation);
        }

        let total = self.store.count_observations().await?;
        Ok((aircraft, observations, total))
    }

    /// Close the run as `FAILED` and build the error to hand back
    async fn fail(&self, run_id: Uuid, cause: StoreError) -> IngestError {
        error!("Ingest run {} failed: {}", run_id, cause);
        metrics::counter!("ingest.runs.failed", "kind" => cause.kind()).increment(1);

        let close_error = match self
            .store
            .finish_ingest_run(run_id, RunOutcome::failed(cause.to_string()), Utc::now())
            .await
        {
            Ok(_) => None,
            Err(e) => {
                warn!(
                    "Could not mark ingest run {} as FAILED; it will remain RUNNING: {}",
                    run_id, e
                );
                Some(e)
            }
        };

        IngestError::Failed {
            run_id,
            source: cause,
            close_error,
        }
    }
}

/// Run one ingest with the single demo sample
pub async fn run_ingest(store: &dyn Store, demo: &DemoAircraft) -> Result<RunResult, IngestError> {
    let sample = demo.sample(Utc::now());
    IngestRunner::new(store).run(std::slice::from_ref(&sample)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_sample_is_near_heathrow() {
        let demo = DemoAircraft::default();
        let now = Utc::now();
        let sample = demo.sample(now);

        assert_eq!(sample.icao24, "40621B");
        assert_eq!(sample.observed_at, now);
        let lat = sample.lat.unwrap();
        let lon = sample.lon.unwrap();
        assert!((51.42..=51.52).contains(&lat));
        assert!((-0.51..=-0.40).contains(&lon));
    }

    #[test]
    fn test_success_message_includes_total() {
        assert_eq!(
            success_message(1, 42),
            "ok: wrote 1 observation(s); total observations = 42"
        );
    }

    #[test]
    fn test_error_accessors() {
        let run_id = Uuid::now_v7();
        let err = IngestError::Failed {
            run_id,
            source: StoreError::connectivity("down"),
            close_error: None,
        };
        assert_eq!(err.run_id(), Some(run_id));
        assert_eq!(err.cause().to_string(), "down");

        let err = IngestError::Open(StoreError::connectivity("refused"));
        assert_eq!(err.run_id(), None);
        assert_eq!(err.to_string(), "failed to open ingest run");
    }

    #[test]
    fn test_error_chain_names_cause_once() {
        let run_id = Uuid::now_v7();
        let err = anyhow::Error::from(IngestError::Failed {
            run_id,
            source: StoreError::connectivity("lost"),
            close_error: None,
        });
        assert_eq!(format!("{err:#}"), format!("ingest run {run_id} failed: lost"));

        let err = anyhow::Error::from(IngestError::Open(StoreError::connectivity("refused")));
        assert_eq!(format!("{err:#}"), "failed to open ingest run: refused");
    }
}

use chrono::{Duration, Utc};

use airspace_intel::aircraft::AircraftUpsert;
use airspace_intel::error::StoreError;
use airspace_intel::ingest::{DemoAircraft, IngestError, IngestRunner, SyntheticSample, run_ingest};
use airspace_intel::ingest_runs::{IngestRunStatus, RunOutcome};
use airspace_intel::memory_store::{FailPoint, MemoryStore};
use airspace_intel::store::Store;

fn sample(icao24: &str, callsign: Option<&str>, seconds_ago: i64) -> SyntheticSample {
    SyntheticSample {
        icao24: icao24.to_string(),
        callsign: callsign.map(str::to_string),
        observed_at: Utc::now() - Duration::seconds(seconds_ago),
        lat: Some(51.47),
        lon: Some(-0.45),
        altitude_m: Some(1100.0),
        ground_speed_ms: Some(125.0),
    }
}

#[tokio::test]
async fn test_ingest_on_empty_store_succeeds() {
    let store = MemoryStore::new();

    let result = run_ingest(&store, &DemoAircraft::default())
        .await
        .expect("ingest should succeed");

    assert_eq!(result.run.status, IngestRunStatus::Success);
    assert!(result.run.finished_at.is_some());
    assert_eq!(result.total_observations, 1);
    assert_eq!(result.observations.len(), 1);
    assert_eq!(result.observations[0].ingest_run_id, Some(result.run.id));

    assert_eq!(store.count_aircraft().await.unwrap(), 1);
    assert_eq!(store.count_observations().await.unwrap(), 1);

    let runs = store.ingest_runs().await;
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, IngestRunStatus::Success);
    assert!(
        runs[0]
            .message
            .as_deref()
            .unwrap()
            .contains("total observations = 1")
    );
}

#[tokio::test]
async fn test_repeated_ingest_reuses_aircraft() {
    let store = MemoryStore::new();
    let demo = DemoAircraft::default();

    run_ingest(&store, &demo).await.unwrap();
    let second = run_ingest(&store, &demo).await.unwrap();

    assert_eq!(second.total_observations, 2);
    assert_eq!(store.count_aircraft().await.unwrap(), 1);
    assert_eq!(store.ingest_runs().await.len(), 2);
}

#[tokio::test]
async fn test_write_failure_marks_run_failed() {
    let store = MemoryStore::new();
    store
        .fail(
            FailPoint::InsertObservation,
            StoreError::connectivity("connection reset by peer"),
        )
        .await;

    let err = run_ingest(&store, &DemoAircraft::default())
        .await
        .expect_err("ingest should fail");

    let run_id = err.run_id().expect("run should have been opened");
    assert_eq!(err.cause().to_string(), "connection reset by peer");
    assert!(matches!(
        err,
        IngestError::Failed {
            close_error: None,
            ..
        }
    ));

    let run = store.get_ingest_run(run_id).await.unwrap().unwrap();
    assert_eq!(run.status, IngestRunStatus::Failed);
    assert!(run.finished_at.is_some());
    assert_eq!(run.message.as_deref(), Some("connection reset by peer"));

    // The aircraft upsert happened before the failing insert
    assert_eq!(store.count_aircraft().await.unwrap(), 1);
    assert_eq!(store.count_observations().await.unwrap(), 0);
}

#[tokio::test]
async fn test_failure_before_any_domain_write_still_closes_run() {
    let store = MemoryStore::new();
    store
        .fail(
            FailPoint::UpsertAircraft,
            StoreError::Constraint {
                constraint: Some("aircraft_icao24_key".to_string()),
                message: "duplicate key value violates unique constraint".to_string(),
            },
        )
        .await;

    let err = run_ingest(&store, &DemoAircraft::default())
        .await
        .unwrap_err();

    let run = store
        .get_ingest_run(err.run_id().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(run.status, IngestRunStatus::Failed);
    assert!(run.finished_at.is_some());
    assert_eq!(
        run.message.as_deref(),
        Some("duplicate key value violates unique constraint")
    );
    assert_eq!(store.count_aircraft().await.unwrap(), 0);
}

#[tokio::test]
async fn test_invalid_icao24_fails_run() {
    let store = MemoryStore::new();
    let demo = DemoAircraft {
        icao24: "NOTHEX".to_string(),
        callsign: None,
    };

    let err = run_ingest(&store, &demo).await.unwrap_err();
    assert!(matches!(err.cause(), StoreError::Constraint { .. }));

    let runs = store.ingest_runs().await;
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, IngestRunStatus::Failed);
}

#[tokio::test]
async fn test_count_failure_after_writes_marks_run_failed() {
    let store = MemoryStore::new();
    store
        .fail(FailPoint::CountObservations, StoreError::connectivity("timeout"))
        .await;

    let err = run_ingest(&store, &DemoAircraft::default())
        .await
        .unwrap_err();

    let runs = store.ingest_runs().await;
    assert_eq!(runs[0].id, err.run_id().unwrap());
    assert_eq!(runs[0].status, IngestRunStatus::Failed);
    assert_eq!(runs[0].message.as_deref(), Some("timeout"));
}

#[tokio::test]
async fn test_open_failure_creates_no_run() {
    let store = MemoryStore::new();
    store
        .fail(FailPoint::CreateIngestRun, StoreError::connectivity("refused"))
        .await;

    let err = run_ingest(&store, &DemoAircraft::default())
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Open(_)));
    assert!(store.ingest_runs().await.is_empty());
    assert_eq!(store.count_aircraft().await.unwrap(), 0);
}

#[tokio::test]
async fn test_close_failure_is_reported_alongside_cause() {
    let store = MemoryStore::new();
    store
        .fail(FailPoint::InsertObservation, StoreError::connectivity("lost"))
        .await;
    store
        .fail(FailPoint::FinishIngestRun, StoreError::connectivity("still lost"))
        .await;

    let err = run_ingest(&store, &DemoAircraft::default())
        .await
        .unwrap_err();

    match err {
        IngestError::Failed {
            source,
            close_error,
            ..
        } => {
            assert_eq!(source.to_string(), "lost");
            assert_eq!(close_error.unwrap().to_string(), "still lost");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Unable to close, the run is left visibly RUNNING
    let runs = store.ingest_runs().await;
    assert_eq!(runs[0].status, IngestRunStatus::Running);
    assert!(runs[0].finished_at.is_none());
}

#[tokio::test]
async fn test_run_has_exactly_one_terminal_transition() {
    let store = MemoryStore::new();
    let result = run_ingest(&store, &DemoAircraft::default()).await.unwrap();

    let err = store
        .finish_ingest_run(result.run.id, RunOutcome::failed("late"), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Constraint { .. }));

    let run = store.get_ingest_run(result.run.id).await.unwrap().unwrap();
    assert_eq!(run.status, IngestRunStatus::Success);
    assert_eq!(run.finished_at, result.run.finished_at);
}

#[tokio::test]
async fn test_runner_writes_every_sample() {
    let store = MemoryStore::new();
    let samples = vec![
        sample("40621B", Some("BAW123"), 30),
        sample("3C6444", Some("DLH4AB"), 20),
        sample("40621b", Some("BAW124"), 10),
    ];

    let result = IngestRunner::new(&store).run(&samples).await.unwrap();

    assert_eq!(result.observations.len(), 3);
    assert_eq!(result.total_observations, 3);
    assert_eq!(store.count_aircraft().await.unwrap(), 2);

    let aircraft = store.find_aircraft("40621B").await.unwrap().unwrap();
    assert_eq!(aircraft.callsign.as_deref(), Some("BAW124"));
}

#[tokio::test]
async fn test_upsert_same_icao24_updates_callsign() {
    let store = MemoryStore::new();

    let first = store
        .upsert_aircraft(AircraftUpsert::new("40621B", Some("BAW123")).unwrap())
        .await
        .unwrap();
    let second = store
        .upsert_aircraft(AircraftUpsert::new("40621B", Some("BAW456")).unwrap())
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(store.count_aircraft().await.unwrap(), 1);

    let stored = store.find_aircraft("40621b").await.unwrap().unwrap();
    assert_eq!(stored.callsign.as_deref(), Some("BAW456"));
}

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::debug;
use uuid::Uuid;

use crate::aircraft::AircraftRef;
use crate::db::PgPool;
use crate::error::StoreError;
use crate::observations::{NewObservation, Observation, ObservationView};
use crate::schema::{aircraft, observations};

// Diesel model for inserting and querying observations
#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::observations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct ObservationRow {
    id: Uuid,
    aircraft_id: Uuid,
    ingest_run_id: Option<Uuid>,
    observed_at: DateTime<Utc>,
    lat: Option<f64>,
    lon: Option<f64>,
    altitude_m: Option<f64>,
    ground_speed_ms: Option<f64>,
    created_at: DateTime<Utc>,
}

impl From<Observation> for ObservationRow {
    fn from(observation: Observation) -> Self {
        Self {
            id: observation.id,
            aircraft_id: observation.aircraft_id,
            ingest_run_id: observation.ingest_run_id,
            observed_at: observation.observed_at,
            lat: observation.lat,
            lon: observation.lon,
            altitude_m: observation.altitude_m,
            ground_speed_ms: observation.ground_speed_ms,
            created_at: observation.created_at,
        }
    }
}

impl From<ObservationRow> for Observation {
    fn from(row: ObservationRow) -> Self {
        Self {
            id: row.id,
            aircraft_id: row.aircraft_id,
            ingest_run_id: row.ingest_run_id,
            observed_at: row.observed_at,
            lat: row.lat,
            lon: row.lon,
            altitude_m: row.altitude_m,
            ground_speed_ms: row.ground_speed_ms,
            created_at: row.created_at,
        }
    }
}

type JoinedRow = (ObservationRow, String, Option<String>);

fn into_view((row, icao24, callsign): JoinedRow) -> ObservationView {
    let observation = Observation::from(row);
    ObservationView::new(&observation, AircraftRef { icao24, callsign })
}

#[derive(Clone)]
pub struct ObservationsRepository {
    pool: PgPool,
}

impl ObservationsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new observation. The referenced aircraft (and run, if any)
    /// must already exist.
    pub async fn insert(&self, new_observation: NewObservation) -> Result<Observation, StoreError> {
        let row = ObservationRow::from(new_observation.into_observation());
        let pool = self.pool.clone();

        let inserted = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let inserted = diesel::insert_into(observations::table)
                .values(&row)
                .returning(ObservationRow::as_returning())
                .get_result(&mut conn)?;
            Ok::<ObservationRow, StoreError>(inserted)
        })
        .await??;

        let observation = Observation::from(inserted);
        debug!(
            "Inserted observation {} for aircraft {}",
            observation.id, observation.aircraft_id
        );
        Ok(observation)
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let pool = self.pool.clone();

        let count = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let count = observations::table.count().get_result(&mut conn)?;
            Ok::<i64, StoreError>(count)
        })
        .await??;

        Ok(count)
    }

    /// Most recent observations by `observed_at`, newest first, joined with
    /// the aircraft address and callsign
    pub async fn get_recent(&self, limit: i64) -> Result<Vec<ObservationView>, StoreError> {
        let pool = self.pool.clone();

        let rows = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let rows: Vec<JoinedRow> = observations::table
                .inner_join(aircraft::table)
                .order((observations::observed_at.desc(), observations::id.desc()))
                .limit(limit.max(0))
                .select((
                    ObservationRow::as_select(),
                    aircraft::icao24,
                    aircraft::callsign,
                ))
                .load(&mut conn)?;
            Ok::<Vec<JoinedRow>, StoreError>(rows)
        })
        .await??;

        Ok(rows.into_iter().map(into_view).collect())
    }

    pub async fn get_latest(&self) -> Result<Option<ObservationView>, StoreError> {
        Ok(self.get_recent(1).await?.into_iter().next())
    }
}

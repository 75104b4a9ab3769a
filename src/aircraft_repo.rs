use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use tracing::debug;
use uuid::Uuid;

use crate::aircraft::{Aircraft, AircraftUpsert};
use crate::db::PgPool;
use crate::error::StoreError;
use crate::schema::aircraft;

// Diesel model for inserting new aircraft
#[derive(Insertable)]
#[diesel(table_name = crate::schema::aircraft)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct NewAircraftRow {
    id: Uuid,
    icao24: String,
    callsign: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AircraftUpsert> for NewAircraftRow {
    fn from(upsert: AircraftUpsert) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            icao24: upsert.icao24,
            callsign: upsert.callsign,
            created_at: now,
            updated_at: now,
        }
    }
}

// Diesel model for querying aircraft
#[derive(Queryable, Selectable)]
#[diesel(table_name = crate::schema::aircraft)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct AircraftRow {
    id: Uuid,
    icao24: String,
    callsign: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AircraftRow> for Aircraft {
    fn from(row: AircraftRow) -> Self {
        Self {
            id: row.id,
            icao24: row.icao24,
            callsign: row.callsign,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct AircraftRepository {
    pool: PgPool,
}

impl AircraftRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert an aircraft, or overwrite the callsign of the existing row with
    /// the same `icao24`. Returns the stored row either way.
    pub async fn upsert(&self, upsert: AircraftUpsert) -> Result<Aircraft, StoreError> {
        let new_row = NewAircraftRow::from(upsert);
        let pool = self.pool.clone();

        let row = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let row = diesel::insert_into(aircraft::table)
                .values(&new_row)
                .on_conflict(aircraft::icao24)
                .do_update()
                .set((
                    aircraft::callsign.eq(excluded(aircraft::callsign)),
                    aircraft::updated_at.eq(excluded(aircraft::updated_at)),
                ))
                .returning(AircraftRow::as_returning())
                .get_result(&mut conn)?;
            Ok::<AircraftRow, StoreError>(row)
        })
        .await??;

        let stored = Aircraft::from(row);
        debug!(
            "Upserted aircraft {} (callsign {:?})",
            stored.icao24, stored.callsign
        );
        Ok(stored)
    }

    /// Look up an aircraft by its normalized address
    pub async fn get_by_icao24(&self, icao24_value: &str) -> Result<Option<Aircraft>, StoreError> {
        let pool = self.pool.clone();
        let icao24_value = icao24_value.to_string();

        let row = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let row = aircraft::table
                .filter(aircraft::icao24.eq(icao24_value))
                .select(AircraftRow::as_select())
                .first(&mut conn)
                .optional()?;
            Ok::<Option<AircraftRow>, StoreError>(row)
        })
        .await??;

        Ok(row.map(Aircraft::from))
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let pool = self.pool.clone();

        let count = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let count = aircraft::table.count().get_result(&mut conn)?;
            Ok::<i64, StoreError>(count)
        })
        .await??;

        Ok(count)
    }
}

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::debug;
use uuid::Uuid;

use crate::db::PgPool;
use crate::error::StoreError;
use crate::ingest_runs::{IngestRun, IngestRunStatus, RunOutcome, check_transition};
use crate::schema::ingest_runs;

// Diesel model for inserting and querying ingest runs
#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::ingest_runs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct IngestRunRow {
    id: Uuid,
    status: IngestRunStatus,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    message: Option<String>,
}

impl From<IngestRun> for IngestRunRow {
    fn from(run: IngestRun) -> Self {
        Self {
            id: run.id,
            status: run.status,
            started_at: run.started_at,
            finished_at: run.finished_at,
            message: run.message,
        }
    }
}

impl From<IngestRunRow> for IngestRun {
    fn from(row: IngestRunRow) -> Self {
        Self {
            id: row.id,
            status: row.status,
            started_at: row.started_at,
            finished_at: row.finished_at,
            message: row.message,
        }
    }
}

#[derive(Clone)]
pub struct IngestRunsRepository {
    pool: PgPool,
}

impl IngestRunsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new `Running` run. The insert commits on its own so the run
    /// is visible before any observation references it.
    pub async fn create(&self, started_at: DateTime<Utc>) -> Result<IngestRun, StoreError> {
        let row = IngestRunRow::from(IngestRun::start(started_at));
        let pool = self.pool.clone();

        let inserted = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let inserted = diesel::insert_into(ingest_runs::table)
                .values(&row)
                .returning(IngestRunRow::as_returning())
                .get_result(&mut conn)?;
            Ok::<IngestRunRow, StoreError>(inserted)
        })
        .await??;

        let run = IngestRun::from(inserted);
        debug!("Created ingest run {}", run.id);
        Ok(run)
    }

    /// Move a running run to its terminal state.
    ///
    /// The update is guarded on `status = 'running'`, so of two concurrent
    /// finishers only one wins; the loser gets a `Constraint` error.
    pub async fn finish(
        &self,
        run_id: Uuid,
        outcome: RunOutcome,
        finished_at: DateTime<Utc>,
    ) -> Result<IngestRun, StoreError> {
        let pool = self.pool.clone();

        let row = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;

            // Reject non-terminal targets before touching the row
            check_transition(run_id, IngestRunStatus::Running, outcome.status)?;

            let updated = diesel::update(
                ingest_runs::table
                    .filter(ingest_runs::id.eq(run_id))
                    .filter(ingest_runs::status.eq(IngestRunStatus::Running)),
            )
            .set((
                ingest_runs::status.eq(outcome.status),
                ingest_runs::finished_at.eq(Some(finished_at)),
                ingest_runs::message.eq(Some(outcome.message.as_str())),
            ))
            .returning(IngestRunRow::as_returning())
            .get_result(&mut conn)
            .optional()?;

            if let Some(row) = updated {
                return Ok::<IngestRunRow, StoreError>(row);
            }

            // Nothing updated: either the run is gone or it already finished
            let current: Option<IngestRunStatus> = ingest_runs::table
                .filter(ingest_runs::id.eq(run_id))
                .select(ingest_runs::status)
                .first(&mut conn)
                .optional()?;

            match current {
                Some(status) => {
                    check_transition(run_id, status, outcome.status)?;
                    Err(StoreError::connectivity(format!(
                        "ingest run {run_id} could not be updated"
                    )))
                }
                None => Err(StoreError::not_found("ingest run", run_id)),
            }
        })
        .await??;

        Ok(IngestRun::from(row))
    }

    pub async fn get_by_id(&self, run_id: Uuid) -> Result<Option<IngestRun>, StoreError> {
        let pool = self.pool.clone();

        let row = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let row = ingest_runs::table
                .filter(ingest_runs::id.eq(run_id))
                .select(IngestRunRow::as_select())
                .first(&mut conn)
                .optional()?;
            Ok::<Option<IngestRunRow>, StoreError>(row)
        })
        .await??;

        Ok(row.map(IngestRun::from))
    }

    /// Most recently started run, if any
    pub async fn get_latest(&self) -> Result<Option<IngestRun>, StoreError> {
        let pool = self.pool.clone();

        let row = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let row = ingest_runs::table
                .order((ingest_runs::started_at.desc(), ingest_runs::id.desc()))
                .select(IngestRunRow::as_select())
                .first(&mut conn)
                .optional()?;
            Ok::<Option<IngestRunRow>, StoreError>(row)
        })
        .await??;

        Ok(row.map(IngestRun::from))
    }
}

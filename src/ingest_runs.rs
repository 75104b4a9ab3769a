use chrono::{DateTime, Utc};
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// Message every run is opened with
pub const STARTING_MESSAGE: &str = "starting";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, DbEnum)]
#[db_enum(existing_type_path = "crate::schema::sql_types::IngestRunStatus")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngestRunStatus {
    #[db_enum(rename = "running")]
    Running,
    #[db_enum(rename = "success")]
    Success,
    #[db_enum(rename = "failed")]
    Failed,
}

impl IngestRunStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, IngestRunStatus::Running)
    }
}

impl std::fmt::Display for IngestRunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestRunStatus::Running => write!(f, "RUNNING"),
            IngestRunStatus::Success => write!(f, "SUCCESS"),
            IngestRunStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// One execution of the ingest process.
///
/// Created `Running` with no `finished_at`; moves exactly once to `Success`
/// or `Failed`, at which point `finished_at` is set and never changes again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRun {
    pub id: Uuid,
    pub status: IngestRunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub message: Option<String>,
}

impl IngestRun {
    /// A fresh run in the `Running` state
    pub fn start(started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            status: IngestRunStatus::Running,
            started_at,
            finished_at: None,
            message: Some(STARTING_MESSAGE.to_string()),
        }
    }

    /// Apply a terminal transition in place.
    ///
    /// Rejects non-terminal targets and runs that already finished, leaving
    /// the run untouched in both cases.
    pub fn finish(
        &mut self,
        outcome: &RunOutcome,
        finished_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        check_transition(self.id, self.status, outcome.status)?;
        self.status = outcome.status;
        self.finished_at = Some(finished_at);
        self.message = Some(outcome.message.clone());
        Ok(())
    }
}

/// Terminal state requested for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub status: IngestRunStatus,
    pub message: String,
}

impl RunOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: IngestRunStatus::Success,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: IngestRunStatus::Failed,
            message: message.into(),
        }
    }
}

/// Validate a lifecycle transition from `current` to `target`
pub fn check_transition(
    run_id: Uuid,
    current: IngestRunStatus,
    target: IngestRunStatus,
) -> Result<(), StoreError> {
    if !target.is_terminal() {
        return Err(StoreError::Constraint {
            constraint: Some("ingest_run_lifecycle".to_string()),
            message: format!("ingest run {run_id} cannot transition to {target}"),
        });
    }
    if current.is_terminal() {
        return Err(StoreError::Constraint {
            constraint: Some("ingest_run_lifecycle".to_string()),
            message: format!("ingest run {run_id} already finished with status {current}"),
        });
    }
    Ok(())
}

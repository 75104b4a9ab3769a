//! Health endpoints
//!
//! - `GET /api/health` is a plain liveness probe and never touches the database
//! - `GET /api/health/db` runs the aggregate health check

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::error;

use super::{SERVICE_NAME, iso_now};
use crate::health::{HealthService, HealthSnapshot};
use crate::web::AppState;

#[derive(Debug, Serialize)]
pub struct LivenessPayload {
    pub ok: bool,
    pub time: String,
    pub service: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub payload: LivenessPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DbState {
    Connected,
    Error,
}

/// Response of the database health check. On error only `ok`, `service`,
/// `db`, `error` and `time` are present.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbHealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub db: DbState,
    #[serde(flatten)]
    pub snapshot: Option<HealthSnapshot>,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DbHealthResponse {
    pub fn connected(snapshot: HealthSnapshot) -> Self {
        Self {
            ok: true,
            service: SERVICE_NAME,
            db: DbState::Connected,
            snapshot: Some(snapshot),
            time: iso_now(),
            error: None,
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            ok: false,
            service: SERVICE_NAME,
            db: DbState::Error,
            snapshot: None,
            time: iso_now(),
            error: Some(error),
        }
    }
}

/// Handler for GET /api/health
pub async fn get_health() -> impl IntoResponse {
    Json(LivenessResponse {
        payload: LivenessPayload {
            ok: true,
            time: iso_now(),
            service: SERVICE_NAME,
        },
    })
}

/// Handler for GET /api/health/db
#[tracing::instrument(skip(state))]
pub async fn get_db_health(State(state): State<AppState>) -> impl IntoResponse {
    let health = HealthService::new(state.store);

    match health.check().await {
        Ok(snapshot) => (StatusCode::OK, Json(DbHealthResponse::connected(snapshot))),
        Err(e) => {
            error!("Database health check failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(DbHealthResponse::failed(e.to_string())),
            )
        }
    }
}

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::error;

use crate::actions::json_error;
use crate::health::HealthService;
use crate::observations::ObservationView;
use crate::web::AppState;

#[derive(Debug, Serialize)]
pub struct RecentObservationsResponse {
    pub ok: bool,
    pub count: usize,
    pub rows: Vec<ObservationView>,
}

/// Handler for GET /api/observations/latest
///
/// Returns the newest observations (fixed page size), newest first
#[tracing::instrument(skip(state))]
pub async fn get_latest_observations(State(state): State<AppState>) -> impl IntoResponse {
    let health = HealthService::new(state.store);

    match health.recent_observations(None).await {
        Ok(rows) => Json(RecentObservationsResponse {
            ok: true,
            count: rows.len(),
            rows,
        })
        .into_response(),
        Err(e) => {
            error!("Failed to load recent observations: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

pub mod health;
pub mod observations;

pub use health::*;
pub use observations::*;

use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// Service name reported by every health payload
pub const SERVICE_NAME: &str = "web";

/// Body of a failed request that has no richer payload of its own
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> impl IntoResponse {
    (
        status,
        Json(ErrorResponse {
            ok: false,
            error: message.into(),
        }),
    )
}

/// Current time as an ISO-8601 string with millisecond precision
pub fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

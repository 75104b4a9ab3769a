use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Connectivity smoke-test record, unrelated to the aircraft data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ping {
    pub id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Ping {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aircraft::AircraftRef;

/// A single kinematic snapshot of an aircraft. Never updated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: Uuid,
    pub aircraft_id: Uuid,

    /// Run that produced this observation, if any
    pub ingest_run_id: Option<Uuid>,

    pub observed_at: DateTime<Utc>,

    /// WGS84 degrees
    pub lat: Option<f64>,
    pub lon: Option<f64>,

    /// Altitude in meters
    pub altitude_m: Option<f64>,

    /// Ground speed in meters per second
    pub ground_speed_ms: Option<f64>,

    pub created_at: DateTime<Utc>,
}

/// Insert input for an observation
#[derive(Debug, Clone, PartialEq)]
pub struct NewObservation {
    pub aircraft_id: Uuid,
    pub ingest_run_id: Option<Uuid>,
    pub observed_at: DateTime<Utc>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub altitude_m: Option<f64>,
    pub ground_speed_ms: Option<f64>,
}

impl NewObservation {
    pub fn into_observation(self) -> Observation {
        Observation {
            id: Uuid::now_v7(),
            aircraft_id: self.aircraft_id,
            ingest_run_id: self.ingest_run_id,
            observed_at: self.observed_at,
            lat: self.lat,
            lon: self.lon,
            altitude_m: self.altitude_m,
            ground_speed_ms: self.ground_speed_ms,
            created_at: Utc::now(),
        }
    }
}

/// Observation joined with its aircraft, as served by the read endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationView {
    pub observed_at: DateTime<Utc>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub altitude_m: Option<f64>,
    pub ground_speed_ms: Option<f64>,
    pub ingest_run_id: Option<Uuid>,
    pub aircraft: AircraftRef,
}

impl ObservationView {
    pub fn new(observation: &Observation, aircraft: AircraftRef) -> Self {
        Self {
            observed_at: observation.observed_at,
            lat: observation.lat,
            lon: observation.lon,
            altitude_m: observation.altitude_m,
            ground_speed_ms: observation.ground_speed_ms,
            ingest_run_id: observation.ingest_run_id,
            aircraft,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_view_serializes_with_camel_case_keys() {
        let run_id = Uuid::now_v7();
        let observed_at = DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let view = ObservationView {
            observed_at,
            lat: Some(51.47),
            lon: Some(-0.4543),
            altitude_m: Some(1200.0),
            ground_speed_ms: None,
            ingest_run_id: Some(run_id),
            aircraft: AircraftRef {
                icao24: "40621B".to_string(),
                callsign: Some("BAW123".to_string()),
            },
        };

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(
            value,
            json!({
                "observedAt": "2025-06-01T12:00:00Z",
                "lat": 51.47,
                "lon": -0.4543,
                "altitudeM": 1200.0,
                "groundSpeedMs": null,
                "ingestRunId": run_id.to_string(),
                "aircraft": { "icao24": "40621B", "callsign": "BAW123" }
            })
        );
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// An aircraft identified by its 24-bit ICAO address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aircraft {
    pub id: Uuid,

    /// Six hex digits, always stored uppercase (e.g., "40621B")
    pub icao24: String,

    /// Display callsign, overwritten on every upsert
    pub callsign: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upsert input for an aircraft, keyed by `icao24`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AircraftUpsert {
    pub icao24: String,
    pub callsign: Option<String>,
}

impl AircraftUpsert {
    /// Build an upsert, normalizing the address and trimming the callsign.
    ///
    /// Blank callsigns are stored as `None`.
    pub fn new(icao24: &str, callsign: Option<&str>) -> Result<Self, StoreError> {
        let icao24 = normalize_icao24(icao24)?;
        let callsign = callsign
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Ok(Self { icao24, callsign })
    }
}

/// Trim and uppercase an ICAO address, rejecting anything that is not exactly
/// six hex digits
pub fn normalize_icao24(raw: &str) -> Result<String, StoreError> {
    let trimmed = raw.trim();
    if trimmed.len() != 6 || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(StoreError::Constraint {
            constraint: Some("aircraft_icao24_format".to_string()),
            message: format!("invalid icao24 address {trimmed:?}: expected 6 hex digits"),
        });
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// Aircraft identity as joined onto observation rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AircraftRef {
    pub icao24: String,
    pub callsign: Option<String>,
}

impl From<&Aircraft> for AircraftRef {
    fn from(aircraft: &Aircraft) -> Self {
        Self {
            icao24: aircraft.icao24.clone(),
            callsign: aircraft.callsign.clone(),
        }
    }
}

impl AircraftRef {
    /// Label shown in dashboards: callsign if present, otherwise the address
    pub fn label(&self) -> &str {
        self.callsign.as_deref().unwrap_or(&self.icao24)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_icao24_uppercases() {
        assert_eq!(normalize_icao24("40621b").unwrap(), "40621B");
        assert_eq!(normalize_icao24("  a1b2c3 ").unwrap(), "A1B2C3");
    }

    #[test]
    fn test_normalize_icao24_rejects_bad_input() {
        assert!(normalize_icao24("").is_err());
        assert!(normalize_icao24("40621").is_err());
        assert!(normalize_icao24("40621BB").is_err());
        assert!(normalize_icao24("ZZZZZZ").is_err());
    }

    #[test]
    fn test_upsert_blank_callsign_is_none() {
        let upsert = AircraftUpsert::new("40621b", Some("   ")).unwrap();
        assert_eq!(upsert.icao24, "40621B");
        assert_eq!(upsert.callsign, None);

        let upsert = AircraftUpsert::new("40621B", Some(" BAW123 ")).unwrap();
        assert_eq!(upsert.callsign.as_deref(), Some("BAW123"));
    }

    #[test]
    fn test_label_prefers_callsign() {
        let with = AircraftRef {
            icao24: "40621B".to_string(),
            callsign: Some("BAW123".to_string()),
        };
        let without = AircraftRef {
            icao24: "40621B".to_string(),
            callsign: None,
        };
        assert_eq!(with.label(), "BAW123");
        assert_eq!(without.label(), "40621B");
    }
}

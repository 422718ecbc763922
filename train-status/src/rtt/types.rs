//! Timetable API response DTOs.
//!
//! These types map directly to the JSON returned by the location search
//! endpoint. They use `Option` liberally because the API omits fields rather
//! than sending nulls, and `services` itself is null when nothing runs.

use serde::{Deserialize, Serialize};

/// Response from `/search/{origin}/to/{destination}/{yyyy}/{mm}/{dd}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// The searched location.
    pub location: Option<SearchLocation>,

    /// The "to" filter location.
    pub filter: Option<SearchFilter>,

    /// Matching services; absent or null when there are none.
    pub services: Option<Vec<ServiceRecord>>,
}

impl SearchResponse {
    /// Consume the response, returning its services (empty if none).
    pub fn into_services(self) -> Vec<ServiceRecord> {
        self.services.unwrap_or_default()
    }
}

/// Location block at the top of a search response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchLocation {
    pub name: Option<String>,
    pub crs: Option<String>,
    pub tiploc: Option<String>,
}

/// Filter block at the top of a search response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    pub destination: Option<SearchLocation>,
}

/// One timetable entry.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    /// Stable schedule identifier (e.g. "W12345").
    pub service_uid: String,

    /// Date the service runs (YYYY-MM-DD).
    pub run_date: Option<String>,

    /// Headcode (e.g. "1A23").
    pub train_identity: Option<String>,

    /// Operator name.
    pub atoc_name: Option<String>,

    /// Times and call points at the searched location.
    pub location_detail: LocationDetail,
}

impl ServiceRecord {
    /// Whether the service is marked as cancelled at the searched location.
    pub fn is_cancelled(&self) -> bool {
        let detail = &self.location_detail;
        detail.cancel_reason_code.is_some()
            || matches!(
                detail.display_as.as_deref(),
                Some("CANCELLED_CALL") | Some("CANCELLED_PASS")
            )
    }
}

/// Per-location detail of a service.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDetail {
    /// Location name.
    pub description: Option<String>,

    /// TIPLOC of the searched location.
    pub tiploc: Option<String>,

    /// CRS of the searched location.
    pub crs: Option<String>,

    /// Public booked departure ("HHMM").
    pub gbtt_booked_departure: Option<String>,

    /// Public booked arrival ("HHMM").
    pub gbtt_booked_arrival: Option<String>,

    /// Real-time (estimated or actual) departure ("HHMM").
    pub realtime_departure: Option<String>,

    /// Real-time (estimated or actual) arrival ("HHMM").
    pub realtime_arrival: Option<String>,

    /// Whether `realtime_departure` is an actual rather than an estimate.
    pub realtime_departure_actual: Option<bool>,

    /// Explicit departure lateness against the public timetable, in minutes.
    pub realtime_gbtt_departure_lateness: Option<i32>,

    /// Where the service started.
    #[serde(default)]
    pub origin: Vec<CallPoint>,

    /// Where the service terminates.
    #[serde(default)]
    pub destination: Vec<CallPoint>,

    /// Present when the service is cancelled here.
    pub cancel_reason_code: Option<String>,

    /// Display hint, e.g. "CALL", "ORIGIN", "CANCELLED_CALL".
    pub display_as: Option<String>,
}

/// An origin or destination entry of a service.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallPoint {
    /// Human-readable location name.
    pub description: Option<String>,

    /// TIPLOC code.
    pub tiploc: Option<String>,

    /// CRS code, where the location is a station.
    pub crs: Option<String>,

    /// Working timetable time ("HHMMSS").
    pub working_time: Option<String>,

    /// Public timetable time ("HHMM").
    pub public_time: Option<String>,

    /// Real-time value, when known.
    pub realtime: Option<String>,
}

impl CallPoint {
    /// Whether this call point is at the given location code (TIPLOC or CRS).
    pub fn is_at(&self, code: &crate::domain::LocationCode) -> bool {
        [self.tiploc.as_deref(), self.crs.as_deref()]
            .into_iter()
            .flatten()
            .any(|c| code.matches(c))
    }
}

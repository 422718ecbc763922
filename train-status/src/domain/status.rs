//! Punctuality status and its device-mode mapping.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Discrete punctuality state of the monitored service.
///
/// `Unknown` means no service satisfied the search window or filters (or
/// the timetable could not be fetched). It is not a lateness measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    OnTime,
    MinorDelay,
    Delayed,
    MajorDelay,
    Unknown,
}

/// Error returned when a status name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(String);

impl Status {
    /// All statuses, in mode order.
    pub const ALL: [Status; 5] = [
        Status::OnTime,
        Status::MinorDelay,
        Status::Delayed,
        Status::MajorDelay,
        Status::Unknown,
    ];

    /// Mode number exposed to device integrations (0 = on time ... 4 = unknown).
    pub fn mode(self) -> u8 {
        match self {
            Status::OnTime => 0,
            Status::MinorDelay => 1,
            Status::Delayed => 2,
            Status::MajorDelay => 3,
            Status::Unknown => 4,
        }
    }

    /// Inverse of [`Status::mode`].
    pub fn from_mode(mode: u8) -> Option<Self> {
        Self::ALL.get(usize::from(mode)).copied()
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Status::OnTime => "On Time",
            Status::MinorDelay => "Minor Delay",
            Status::Delayed => "Delayed",
            Status::MajorDelay => "Major Delay",
            Status::Unknown => "Unknown",
        }
    }

    /// Wire name, as used in serialized events.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::OnTime => "ON_TIME",
            Status::MinorDelay => "MINOR_DELAY",
            Status::Delayed => "DELAYED",
            Status::MajorDelay => "MAJOR_DELAY",
            Status::Unknown => "UNKNOWN",
        }
    }

    /// Whether this status reflects an actual measurement of a selected service.
    pub fn is_known(self) -> bool {
        self != Status::Unknown
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

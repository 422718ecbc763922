//! Outbound status change events.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::Status;

/// Emitted whenever the observed status or delay changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeEvent {
    /// Local time of the poll that produced the event.
    pub timestamp: NaiveDateTime,

    /// Status last emitted, `None` for the first event.
    pub previous_status: Option<Status>,

    pub current_status: Status,

    /// Lateness in minutes, when it could be measured.
    pub delay_minutes: Option<i32>,

    /// UID of the service the status describes.
    pub selected_service_id: Option<String>,

    /// Fetch failure that led to an unknown status.
    pub error: Option<String>,
}

impl StatusChangeEvent {
    /// Whether the status itself changed, as opposed to only the delay.
    pub fn status_changed(&self) -> bool {
        self.previous_status != Some(self.current_status)
    }
}

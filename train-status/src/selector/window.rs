//! Departure search window with day-rollover handling.

use crate::domain::{ClockTime, MINUTES_PER_DAY, normalize_rollover};
use crate::rtt::ServiceRecord;

use super::options::SelectionOptions;
use super::select::departure_time;

/// The range of acceptable departures, in minutes since today's midnight.
///
/// Bounds may exceed 1440 when the window reaches into tomorrow. Clock
/// times earlier than "now" are placed on the following day before being
/// compared against the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    now_minute: u32,
    earliest: u32,
    latest: u32,
}

impl SearchWindow {
    /// Derive the window from "now" and the selection options.
    ///
    /// ```
    /// use train_status::domain::ClockTime;
    /// use train_status::selector::{SearchWindow, SelectionOptions};
    ///
    /// let now = ClockTime::parse("0800").unwrap();
    /// let window = SearchWindow::new(now, &SelectionOptions::new(5, 60));
    /// assert_eq!(window.earliest(), 485);
    /// assert_eq!(window.latest(), 545);
    /// ```
    pub fn new(now: ClockTime, options: &SelectionOptions) -> Self {
        let now_minute = now.minute_of_day();
        let earliest = now_minute.saturating_add(options.min_after_minutes);
        Self {
            now_minute,
            earliest,
            latest: earliest.saturating_add(options.window_minutes),
        }
    }

    pub fn now_minute(&self) -> u32 {
        self.now_minute
    }

    pub fn earliest(&self) -> u32 {
        self.earliest
    }

    pub fn latest(&self) -> u32 {
        self.latest
    }

    /// Place a clock time on the timeline starting at "now".
    pub fn normalize(&self, time: ClockTime) -> u32 {
        normalize_rollover(time.minute_of_day(), self.now_minute)
    }

    /// Whether a normalized minute lies within `[earliest, latest]`.
    pub fn contains(&self, minute: u32) -> bool {
        (self.earliest..=self.latest).contains(&minute)
    }

    /// Whether the window reaches past midnight into tomorrow.
    pub fn crosses_midnight(&self) -> bool {
        self.latest >= MINUTES_PER_DAY
    }
}

/// Combine today's and tomorrow's search results for a midnight-crossing window.
///
/// Today's services count only if they leave at or after "now"; tomorrow's
/// only if they leave before it (otherwise normalization would misplace
/// them onto today's timeline). Records with no readable departure are
/// kept from today's list so the selector can report them.
pub fn merge_rollover(
    today: Vec<ServiceRecord>,
    tomorrow: Vec<ServiceRecord>,
    window: &SearchWindow,
) -> Vec<ServiceRecord> {
    let now = window.now_minute();

    let today = today.into_iter().filter(|r| match departure_time(r) {
        Some(t) => t.minute_of_day() >= now,
        None => true,
    });
    let tomorrow = tomorrow.into_iter().filter(|r| match departure_time(r) {
        Some(t) => t.minute_of_day() < now,
        None => false,
    });

    today.chain(tomorrow).collect()
}

//! Monitor configuration.

use std::time::Duration;

use crate::punctuality::Thresholds;
use crate::resilience::{BreakerConfig, RetryConfig};
use crate::rtt::Route;
use crate::selector::SelectionOptions;

/// Everything the monitor needs to know besides where to fetch from.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Origin and destination being watched.
    pub route: Route,

    /// Departure window for candidate selection.
    pub selection: SelectionOptions,

    /// Time between polls.
    pub poll_interval: Duration,

    /// Retry tuning for timetable fetches.
    pub retry: RetryConfig,

    /// Circuit breaker tuning for timetable fetches.
    pub breaker: BreakerConfig,

    /// Lateness cutoffs.
    pub thresholds: Thresholds,
}

impl MonitorConfig {
    /// Default tuning for `route`: poll every minute, look 20 to 80 minutes ahead.
    pub fn new(route: Route) -> Self {
        Self {
            route,
            selection: SelectionOptions::default(),
            poll_interval: Duration::from_secs(60),
            retry: RetryConfig::default(),
            breaker: BreakerConfig::default(),
            thresholds: Thresholds::default(),
        }
    }

    pub fn with_selection(mut self, selection: SelectionOptions) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_breaker(mut self, breaker: BreakerConfig) -> Self {
        self.breaker = breaker;
        self
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }
}

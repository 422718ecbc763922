//! Timetable API client.
//!
//! This module provides an HTTP client for the real-time timetable search
//! API, its response DTOs, and the [`TimetableSource`] seam the monitor
//! fetches through.
//!
//! Key characteristics of the API:
//! - One request returns every service between two locations on a date
//! - Times are clock strings with no date ("0810", working times "081030")
//! - `services` is null rather than empty when nothing runs

mod client;
mod error;
mod mock;
mod types;

use std::fmt;

use chrono::NaiveDate;

use crate::domain::LocationCode;

pub use client::{RttClient, RttConfig};
pub use error::RttError;
pub use mock::MockTimetable;
pub use types::{
    CallPoint, LocationDetail, SearchFilter, SearchLocation, SearchResponse, ServiceRecord,
};

/// An origin/destination pair to search between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Route {
    pub origin: LocationCode,
    pub destination: LocationCode,
}

impl Route {
    pub fn new(origin: LocationCode, destination: LocationCode) -> Self {
        Self {
            origin,
            destination,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.origin, self.destination)
    }
}

/// Source of timetable search results.
///
/// This abstraction allows the monitor to be tested with mock data.
pub trait TimetableSource: Send + Sync {
    /// Fetch services running along `route` on `date`.
    fn search(
        &self,
        route: &Route,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<ServiceRecord>, RttError>> + Send;
}

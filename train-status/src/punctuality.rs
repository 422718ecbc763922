//! Punctuality classification of a selected service.
//!
//! Lateness is taken from the explicit real-time lateness field when the
//! feed provides one, otherwise derived from real-time minus booked
//! departure. Cancellation always wins and maps to [`Status::MajorDelay`].

use std::fmt;

use crate::domain::{ClockTime, Status, signed_difference};
use crate::rtt::ServiceRecord;

/// Ascending lateness cutoffs in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Up to this many minutes is on time.
    pub minor: u32,
    /// Up to this many minutes is a minor delay.
    pub delayed: u32,
    /// Up to this many minutes is delayed; beyond is a major delay.
    pub major: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            minor: 2,
            delayed: 5,
            major: 10,
        }
    }
}

impl Thresholds {
    pub fn new(minor: u32, delayed: u32, major: u32) -> Self {
        Self {
            minor,
            delayed,
            major,
        }
    }

    /// Status for a lateness of `minutes`; early and late are treated alike.
    pub fn status_for(&self, minutes: i32) -> Status {
        let late = minutes.unsigned_abs();
        if late <= self.minor {
            Status::OnTime
        } else if late <= self.delayed {
            Status::MinorDelay
        } else if late <= self.major {
            Status::Delayed
        } else {
            Status::MajorDelay
        }
    }
}

/// How late a service is, if that can be told at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lateness {
    /// Signed minutes; positive is late, negative early.
    Measured(i32),
    /// Neither an explicit lateness nor a real-time departure was available.
    Unavailable,
}

impl Lateness {
    /// Lateness of a record, from the explicit field or the departure times.
    pub fn of(record: &ServiceRecord) -> Self {
        let detail = &record.location_detail;
        if let Some(minutes) = detail.realtime_gbtt_departure_lateness {
            return Lateness::Measured(minutes);
        }

        let booked = parse(detail.gbtt_booked_departure.as_deref());
        let actual = parse(detail.realtime_departure.as_deref());
        match (booked, actual) {
            (Some(booked), Some(actual)) => Lateness::Measured(signed_difference(booked, actual)),
            _ => Lateness::Unavailable,
        }
    }

    pub fn minutes(self) -> Option<i32> {
        match self {
            Lateness::Measured(m) => Some(m),
            Lateness::Unavailable => None,
        }
    }
}

impl fmt::Display for Lateness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lateness::Measured(m) => write!(f, "{m:+} min"),
            Lateness::Unavailable => f.write_str("unavailable"),
        }
    }
}

/// Result of classifying one poll's selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Punctuality {
    pub status: Status,
    pub lateness: Lateness,
}

impl Punctuality {
    /// Nothing was selected.
    pub const UNKNOWN: Punctuality = Punctuality {
        status: Status::Unknown,
        lateness: Lateness::Unavailable,
    };

    /// Lateness in minutes for outbound events.
    pub fn delay_minutes(&self) -> Option<i32> {
        self.lateness.minutes()
    }
}

/// Classify the selected record, or `None` when nothing was selected.
///
/// Unavailable lateness classifies as on time but is kept distinct in
/// the returned [`Lateness`].
pub fn classify(record: Option<&ServiceRecord>, thresholds: &Thresholds) -> Punctuality {
    let Some(record) = record else {
        return Punctuality::UNKNOWN;
    };

    let lateness = Lateness::of(record);
    let status = if record.is_cancelled() {
        Status::MajorDelay
    } else {
        thresholds.status_for(lateness.minutes().unwrap_or(0))
    };

    Punctuality { status, lateness }
}

fn parse(field: Option<&str>) -> Option<ClockTime> {
    field.and_then(|s| ClockTime::parse(s).ok())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Status never improves as lateness grows.
        #[test]
        fn monotonic_in_lateness(a in 0i32..200, b in 0i32..200) {
            let t = Thresholds::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(t.status_for(lo).mode() <= t.status_for(hi).mode());
        }

        /// Early and late by the same amount classify identically.
        #[test]
        fn symmetric(m in 0i32..500) {
            let t = Thresholds::default();
            prop_assert_eq!(t.status_for(m), t.status_for(-m));
        }

        /// A classified record is never Unknown.
        #[test]
        fn record_is_never_unknown(m in -100i32..100, cancelled in any::<bool>()) {
            let mut record = ServiceRecord::default();
            record.location_detail.realtime_gbtt_departure_lateness = Some(m);
            if cancelled {
                record.location_detail.cancel_reason_code = Some("X".into());
            }
            prop_assert!(classify(Some(&record), &Thresholds::default()).status.is_known());
        }
    }
}

//! Domain types for the train status monitor.
//!
//! This module contains the validated value types shared by the selector,
//! the classifier and the monitor. Types enforce their invariants at
//! construction time.

mod location;
mod status;
mod time;

pub use location::{InvalidLocationCode, LocationCode};
pub use status::{Status, UnknownStatus};
pub use time::{
    ClockTime, MINUTES_PER_DAY, TimeError, forward_gap, normalize_rollover, signed_difference,
};

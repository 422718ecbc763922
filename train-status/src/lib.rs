//! Train punctuality monitor.
//!
//! Watches one origin/destination pair on the real-time timetable API and
//! answers: "is the next train I can catch running on time?"
//!
//! Each poll goes through a retrying, circuit-broken client, picks the
//! best service departing soon, classifies its lateness, and publishes a
//! status change event when the answer changes.

pub mod domain;
pub mod monitor;
pub mod punctuality;
pub mod resilience;
pub mod rtt;
pub mod selector;

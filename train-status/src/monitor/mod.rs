//! Polling orchestration.
//!
//! A [`TrainMonitor`] periodically fetches the timetable for one route,
//! selects the service to watch, classifies its punctuality, and publishes
//! a [`StatusChangeEvent`] to its subscribers whenever the status or delay
//! differs from what was last published.

mod clock;
mod config;
mod event;
mod notifier;
mod orchestrator;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::MonitorConfig;
pub use event::StatusChangeEvent;
pub use notifier::{ChannelSubscriber, LogSubscriber, StatusNotifier, Subscriber};
pub use orchestrator::{MonitorHandle, PollOutcome, TrainMonitor};

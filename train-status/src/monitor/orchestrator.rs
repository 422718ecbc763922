//! The polling loop.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::domain::{ClockTime, Status};
use crate::punctuality::{Punctuality, classify};
use crate::resilience::{ResilientClient, ResilientError};
use crate::rtt::{RttError, ServiceRecord, TimetableSource};
use crate::selector::{SearchWindow, merge_rollover, select_with_report};

use super::clock::{Clock, SystemClock};
use super::config::MonitorConfig;
use super::event::StatusChangeEvent;
use super::notifier::{StatusNotifier, Subscriber};

/// What one poll observed.
#[derive(Debug, Clone)]
pub struct PollOutcome {
    pub punctuality: Punctuality,

    /// UID of the selected service, if any.
    pub selected_service_id: Option<String>,

    /// Records returned by the timetable before selection.
    pub fetched: usize,

    /// Fetch failure, rendered for display.
    pub error: Option<String>,

    /// The event published by this poll, if the state changed.
    pub event: Option<StatusChangeEvent>,
}

impl PollOutcome {
    pub fn status(&self) -> Status {
        self.punctuality.status
    }

    pub fn emitted(&self) -> bool {
        self.event.is_some()
    }
}

/// Watches one route and reports punctuality changes to subscribers.
pub struct TrainMonitor<S, C = SystemClock> {
    config: MonitorConfig,
    source: S,
    client: Arc<ResilientClient>,
    clock: C,
    notifier: StatusNotifier,
    last_emitted: Option<(Status, Option<i32>)>,
}

impl<S: TimetableSource> TrainMonitor<S> {
    /// Monitor fetching from `source` through `client`, on the system clock.
    pub fn new(config: MonitorConfig, source: S, client: Arc<ResilientClient>) -> Self {
        Self {
            config,
            source,
            client,
            clock: SystemClock,
            notifier: StatusNotifier::new(),
            last_emitted: None,
        }
    }
}

impl<S: TimetableSource, C: Clock> TrainMonitor<S, C> {
    pub fn with_clock<C2: Clock>(self, clock: C2) -> TrainMonitor<S, C2> {
        TrainMonitor {
            config: self.config,
            source: self.source,
            client: self.client,
            clock,
            notifier: self.notifier,
            last_emitted: self.last_emitted,
        }
    }

    pub fn subscribe(&mut self, subscriber: impl Subscriber + 'static) {
        self.notifier.subscribe(subscriber);
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Status from the most recent event, if any has been emitted.
    pub fn last_status(&self) -> Option<Status> {
        self.last_emitted.map(|(status, _)| status)
    }

    /// Fetch, select, classify, and publish if anything changed.
    ///
    /// Never fails: fetch errors become an unknown status carrying the error text.
    pub async fn poll_once(&mut self) -> PollOutcome {
        let now = self.clock.now();
        let window = SearchWindow::new(ClockTime::from(now.time()), &self.config.selection);

        let (punctuality, selected, fetched, error) = match self.fetch(now.date(), &window).await {
            Ok(records) => {
                let report = select_with_report(
                    &records,
                    &self.config.route.destination,
                    &self.config.selection,
                    ClockTime::from(now.time()),
                );
                let chosen = report.chosen.as_ref().map(|c| c.record);
                let punctuality = classify(chosen, &self.config.thresholds);
                let selected = chosen.map(|r| r.service_uid.clone());
                (punctuality, selected, records.len(), None)
            }
            Err(e) => {
                warn!(route = %self.config.route, error = %e, "timetable fetch failed");
                (Punctuality::UNKNOWN, None, 0, Some(e.to_string()))
            }
        };

        debug!(
            route = %self.config.route,
            status = %punctuality.status,
            lateness = %punctuality.lateness,
            service = selected.as_deref(),
            fetched,
            "poll complete"
        );

        let event = self.emit_if_changed(now, punctuality, &selected, &error);

        PollOutcome {
            punctuality,
            selected_service_id: selected,
            fetched,
            error,
            event,
        }
    }

    /// Today's services, plus tomorrow's when the window reaches past midnight.
    ///
    /// Only a failure fetching today fails the poll.
    async fn fetch(
        &self,
        today: NaiveDate,
        window: &SearchWindow,
    ) -> Result<Vec<ServiceRecord>, ResilientError<RttError>> {
        if !window.crosses_midnight() {
            return self.fetch_day(today).await;
        }

        let Some(tomorrow) = today.succ_opt() else {
            return self.fetch_day(today).await;
        };

        let (today, next_day) =
            futures::future::join(self.fetch_day(today), self.fetch_day(tomorrow)).await;
        let next_day = next_day.unwrap_or_else(|e| {
            warn!(
                route = %self.config.route,
                date = %tomorrow,
                error = %e,
                "next day's timetable unavailable, selecting from today only"
            );
            Vec::new()
        });
        Ok(merge_rollover(today?, next_day, window))
    }

    async fn fetch_day(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<ServiceRecord>, ResilientError<RttError>> {
        let route = self.config.route;
        let source = &self.source;
        self.client
            .call(move || async move { source.search(&route, date).await })
            .await
    }

    fn emit_if_changed(
        &mut self,
        now: NaiveDateTime,
        punctuality: Punctuality,
        selected: &Option<String>,
        error: &Option<String>,
    ) -> Option<StatusChangeEvent> {
        let current = (punctuality.status, punctuality.delay_minutes());
        if self.last_emitted == Some(current) {
            return None;
        }

        let event = StatusChangeEvent {
            timestamp: now,
            previous_status: self.last_status(),
            current_status: punctuality.status,
            delay_minutes: punctuality.delay_minutes(),
            selected_service_id: selected.clone(),
            error: error.clone(),
        };
        self.last_emitted = Some(current);
        self.notifier.publish(&event);
        Some(event)
    }
}

impl<S, C> TrainMonitor<S, C>
where
    S: TimetableSource + 'static,
    C: Clock + 'static,
{
    /// Run the poll loop on the current tokio runtime.
    ///
    /// The first poll happens immediately. Polls never overlap; ticks missed
    /// while a poll is running are skipped. The loop also ends if the handle
    /// is dropped.
    pub fn spawn(mut self) -> MonitorHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let interval = self.config.poll_interval;

        let task = tokio::spawn(async move {
            info!(route = %self.config.route, interval_secs = interval.as_secs(), "monitor started");
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {}
                }
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => {
                        debug!("abandoning in-flight poll");
                        break;
                    }
                    _ = self.poll_once() => {}
                }
            }

            info!(route = %self.config.route, "monitor stopped");
        });

        MonitorHandle { stop_tx, task }
    }
}

/// Control handle for a spawned monitor.
#[derive(Debug)]
pub struct MonitorHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Ask the loop to stop. Returns immediately; no further events follow
    /// once the loop observes it.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to exit.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            warn!(error = %e, "monitor task ended abnormally");
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;

//! Delivery of status change events to subscribers.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::event::StatusChangeEvent;

/// Receives status change events, synchronously, in subscription order.
pub trait Subscriber: Send + Sync {
    fn notify(&self, event: &StatusChangeEvent);
}

impl<F> Subscriber for F
where
    F: Fn(&StatusChangeEvent) + Send + Sync,
{
    fn notify(&self, event: &StatusChangeEvent) {
        self(event)
    }
}

/// Forwards events into an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSubscriber {
    tx: mpsc::UnboundedSender<StatusChangeEvent>,
}

impl ChannelSubscriber {
    /// Create a subscriber and the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StatusChangeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Subscriber for ChannelSubscriber {
    fn notify(&self, event: &StatusChangeEvent) {
        if self.tx.send(event.clone()).is_err() {
            debug!("event receiver dropped, discarding status change");
        }
    }
}

/// Logs each event at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSubscriber;

impl Subscriber for LogSubscriber {
    fn notify(&self, event: &StatusChangeEvent) {
        info!(
            previous = event.previous_status.map(|s| s.as_str()),
            current = %event.current_status,
            label = event.current_status.label(),
            delay_minutes = event.delay_minutes,
            service = event.selected_service_id.as_deref(),
            error = event.error.as_deref(),
            "train status changed"
        );
    }
}

/// Fan-out to zero or more subscribers.
#[derive(Clone, Default)]
pub struct StatusNotifier {
    subscribers: Vec<Arc<dyn Subscriber>>,
}

impl fmt::Debug for StatusNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusNotifier")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl StatusNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl Subscriber + 'static) {
        self.subscribers.push(Arc::new(subscriber));
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver `event` to every subscriber.
    pub fn publish(&self, event: &StatusChangeEvent) {
        for subscriber in &self.subscribers {
            subscriber.notify(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Status;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    fn event(status: Status) -> StatusChangeEvent {
        StatusChangeEvent {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 15)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            previous_status: None,
            current_status: status,
            delay_minutes: None,
            selected_service_id: None,
            error: None,
        }
    }

    #[test]
    fn closures_are_subscribers_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut notifier = StatusNotifier::new();

        let first = Arc::clone(&seen);
        notifier.subscribe(move |e: &StatusChangeEvent| {
            first.lock().unwrap().push(("first", e.current_status))
        });
        let second = Arc::clone(&seen);
        notifier.subscribe(move |e: &StatusChangeEvent| {
            second.lock().unwrap().push(("second", e.current_status))
        });

        notifier.publish(&event(Status::Delayed));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("first", Status::Delayed), ("second", Status::Delayed)]
        );
    }

    #[test]
    fn no_subscribers_is_fine() {
        let notifier = StatusNotifier::new();
        assert!(notifier.is_empty());
        notifier.publish(&event(Status::OnTime));
    }

    #[tokio::test]
    async fn channel_subscriber_forwards() {
        let (subscriber, mut rx) = ChannelSubscriber::channel();
        let mut notifier = StatusNotifier::new();
        notifier.subscribe(subscriber);
        notifier.subscribe(LogSubscriber);
        assert_eq!(notifier.len(), 2);

        notifier.publish(&event(Status::MajorDelay));
        let received = rx.recv().await.unwrap();
        assert_eq!(received.current_status, Status::MajorDelay);
    }

    #[test]
    fn channel_subscriber_survives_dropped_receiver() {
        let (subscriber, rx) = ChannelSubscriber::channel();
        drop(rx);
        subscriber.notify(&event(Status::Unknown));
    }
}

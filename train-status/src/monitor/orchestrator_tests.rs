//! Poll loop tests against the mock timetable.

use super::*;
use crate::domain::LocationCode;
use crate::monitor::{ChannelSubscriber, FixedClock};
use crate::resilience::{BreakerConfig, BreakerState, FixedJitter, RetryConfig};
use crate::rtt::{CallPoint, LocationDetail, MockTimetable, Route};
use crate::selector::SelectionOptions;
use std::time::Duration;

fn route() -> Route {
    Route::new(
        LocationCode::parse("CBG").unwrap(),
        LocationCode::parse("KGX").unwrap(),
    )
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
    day(d).and_hms_opt(h, m, 0).unwrap()
}

fn service(uid: &str, dep: &str, arr: &str, lateness: Option<i32>) -> ServiceRecord {
    ServiceRecord {
        service_uid: uid.to_string(),
        location_detail: LocationDetail {
            gbtt_booked_departure: Some(dep.to_string()),
            realtime_gbtt_departure_lateness: lateness,
            destination: vec![CallPoint {
                crs: Some("KGX".into()),
                public_time: Some(arr.to_string()),
                ..Default::default()
            }],
            ..Default::default()
        },
        ..Default::default()
    }
}

fn client(max_retries: u32) -> Arc<ResilientClient> {
    Arc::new(
        ResilientClient::new(
            "rtt",
            RetryConfig::default()
                .with_max_retries(max_retries)
                .with_backoff(Duration::from_millis(100), Duration::from_secs(1)),
            BreakerConfig::default(),
        )
        .with_jitter(Arc::new(FixedJitter(0.0))),
    )
}

fn monitor_with(
    mock: &MockTimetable,
    clock: &FixedClock,
    client: Arc<ResilientClient>,
) -> TrainMonitor<MockTimetable, FixedClock> {
    let config = MonitorConfig::new(route()).with_selection(SelectionOptions::new(5, 60));
    TrainMonitor::new(config, mock.clone(), client).with_clock(clock.clone())
}

fn monitor(mock: &MockTimetable, clock: &FixedClock) -> TrainMonitor<MockTimetable, FixedClock> {
    monitor_with(mock, clock, client(3))
}

async fn morning_mock(lateness: Option<i32>) -> MockTimetable {
    let mock = MockTimetable::new();
    mock.set_services(
        route(),
        vec![
            service("A", "0810", "0900", lateness),
            service("B", "0830", "0920", Some(0)),
            service("C", "0850", "0940", Some(0)),
        ],
    )
    .await;
    mock
}

#[tokio::test]
async fn first_poll_emits_selected_service() {
    let mock = morning_mock(Some(3)).await;
    let clock = FixedClock::new(at(15, 8, 0));
    let mut monitor = monitor(&mock, &clock);

    let outcome = monitor.poll_once().await;

    assert_eq!(outcome.status(), Status::MinorDelay);
    assert_eq!(outcome.selected_service_id.as_deref(), Some("A"));
    assert_eq!(outcome.fetched, 3);
    let event = outcome.event.unwrap();
    assert_eq!(event.previous_status, None);
    assert_eq!(event.current_status, Status::MinorDelay);
    assert_eq!(event.delay_minutes, Some(3));
    assert_eq!(event.selected_service_id.as_deref(), Some("A"));
    assert_eq!(event.timestamp, at(15, 8, 0));
    assert_eq!(event.error, None);
}

#[tokio::test]
async fn unchanged_state_is_not_republished() {
    let mock = morning_mock(Some(0)).await;
    let clock = FixedClock::new(at(15, 8, 0));
    let mut monitor = monitor(&mock, &clock);
    let (subscriber, mut rx) = ChannelSubscriber::channel();
    monitor.subscribe(subscriber);

    assert!(monitor.poll_once().await.emitted());
    assert!(!monitor.poll_once().await.emitted());

    assert_eq!(rx.recv().await.unwrap().current_status, Status::OnTime);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn delay_change_within_status_is_published() {
    let mock = morning_mock(Some(3)).await;
    let clock = FixedClock::new(at(15, 8, 0));
    let mut monitor = monitor(&mock, &clock);

    monitor.poll_once().await;
    mock.set_services(route(), vec![service("A", "0810", "0900", Some(4))])
        .await;
    let outcome = monitor.poll_once().await;

    let event = outcome.event.unwrap();
    assert_eq!(event.previous_status, Some(Status::MinorDelay));
    assert_eq!(event.current_status, Status::MinorDelay);
    assert_eq!(event.delay_minutes, Some(4));
    assert!(!event.status_changed());
}

#[tokio::test]
async fn status_change_reports_previous() {
    let mock = morning_mock(Some(0)).await;
    let clock = FixedClock::new(at(15, 8, 0));
    let mut monitor = monitor(&mock, &clock);

    monitor.poll_once().await;
    mock.set_services(route(), vec![service("A", "0810", "0900", Some(12))])
        .await;
    let event = monitor.poll_once().await.event.unwrap();

    assert_eq!(event.previous_status, Some(Status::OnTime));
    assert_eq!(event.current_status, Status::MajorDelay);
    assert_eq!(monitor.last_status(), Some(Status::MajorDelay));
}

#[tokio::test]
async fn no_candidate_is_unknown_once() {
    let mock = MockTimetable::new();
    mock.set_services(route(), vec![service("LATE", "1400", "1450", Some(0))])
        .await;
    let clock = FixedClock::new(at(15, 8, 0));
    let mut monitor = monitor(&mock, &clock);

    let first = monitor.poll_once().await;
    assert_eq!(first.status(), Status::Unknown);
    assert_eq!(first.selected_service_id, None);
    let event = first.event.unwrap();
    assert_eq!(event.delay_minutes, None);
    assert_eq!(event.error, None);

    let second = monitor.poll_once().await;
    assert_eq!(second.status(), Status::Unknown);
    assert!(!second.emitted());
}

#[tokio::test(start_paused = true)]
async fn fatal_fetch_error_is_unknown_with_error_text() {
    let mock = morning_mock(Some(0)).await;
    mock.fail_next(401).await;
    let clock = FixedClock::new(at(15, 8, 0));
    let mut monitor = monitor(&mock, &clock);

    let outcome = monitor.poll_once().await;

    assert_eq!(mock.call_count(), 1);
    assert_eq!(outcome.status(), Status::Unknown);
    let error = outcome.error.unwrap();
    assert!(error.contains("401"), "unexpected error text: {error}");
    assert_eq!(outcome.event.unwrap().error.as_deref(), Some(error.as_str()));
}

#[tokio::test(start_paused = true)]
async fn transient_fetch_errors_are_retried() {
    let mock = morning_mock(Some(6)).await;
    mock.fail_next(503).await;
    mock.fail_next(429).await;
    let clock = FixedClock::new(at(15, 8, 0));
    let mut monitor = monitor(&mock, &clock);

    let outcome = monitor.poll_once().await;

    assert_eq!(mock.call_count(), 3);
    assert_eq!(outcome.status(), Status::Delayed);
    assert_eq!(outcome.error, None);
}

#[tokio::test(start_paused = true)]
async fn recovery_after_failure_is_published() {
    let mock = morning_mock(Some(0)).await;
    mock.fail_next(404).await;
    let clock = FixedClock::new(at(15, 8, 0));
    let mut monitor = monitor(&mock, &clock);

    assert_eq!(monitor.poll_once().await.status(), Status::Unknown);
    let event = monitor.poll_once().await.event.unwrap();
    assert_eq!(event.previous_status, Some(Status::Unknown));
    assert_eq!(event.current_status, Status::OnTime);
}

#[tokio::test(start_paused = true)]
async fn open_circuit_skips_the_source() {
    let mock = morning_mock(Some(0)).await;
    for _ in 0..5 {
        mock.fail_next(500).await;
    }
    let clock = FixedClock::new(at(15, 8, 0));
    let client = client(0);
    let mut monitor = monitor_with(&mock, &clock, Arc::clone(&client));

    for _ in 0..5 {
        monitor.poll_once().await;
    }
    assert_eq!(client.breaker().state(), BreakerState::Open);
    assert_eq!(mock.call_count(), 5);

    let outcome = monitor.poll_once().await;
    assert_eq!(mock.call_count(), 5);
    assert_eq!(outcome.status(), Status::Unknown);
    assert!(!outcome.emitted());
    assert!(outcome.error.unwrap().contains("circuit open"));
}

#[tokio::test]
async fn window_across_midnight_fetches_both_days() {
    let mock = MockTimetable::new();
    mock.set_services_on(
        route(),
        day(15),
        vec![service("TODAY", "2355", "0045", Some(0))],
    )
    .await;
    mock.set_services_on(
        route(),
        day(16),
        vec![
            service("TOMORROW", "0010", "0105", Some(1)),
            service("NEXT_NIGHT", "2356", "0050", Some(0)),
        ],
    )
    .await;
    let clock = FixedClock::new(at(15, 23, 50));
    let config = MonitorConfig::new(route());
    let mut monitor = TrainMonitor::new(config, mock.clone(), client(0)).with_clock(clock);

    let outcome = monitor.poll_once().await;

    assert_eq!(mock.call_count(), 2);
    assert_eq!(outcome.fetched, 2);
    assert_eq!(outcome.selected_service_id.as_deref(), Some("TOMORROW"));
    assert_eq!(outcome.status(), Status::OnTime);
    assert_eq!(outcome.punctuality.delay_minutes(), Some(1));
}

#[tokio::test]
async fn missing_next_day_still_selects_from_today() {
    let mock = MockTimetable::new();
    mock.set_services_on(
        route(),
        day(15),
        vec![service("TODAY", "2355", "0045", Some(0))],
    )
    .await;
    let clock = FixedClock::new(at(15, 23, 30));
    let config = MonitorConfig::new(route());
    let mut monitor = TrainMonitor::new(config, mock.clone(), client(0)).with_clock(clock);

    let outcome = monitor.poll_once().await;

    assert_eq!(mock.call_count(), 2);
    assert_eq!(outcome.error, None);
    assert_eq!(outcome.selected_service_id.as_deref(), Some("TODAY"));
    assert_eq!(outcome.status(), Status::OnTime);
}

#[tokio::test]
async fn missing_today_fails_the_poll_across_midnight() {
    let mock = MockTimetable::new();
    mock.set_services_on(
        route(),
        day(16),
        vec![service("TOMORROW", "0010", "0105", Some(0))],
    )
    .await;
    let clock = FixedClock::new(at(15, 23, 50));
    let config = MonitorConfig::new(route());
    let mut monitor = TrainMonitor::new(config, mock.clone(), client(0)).with_clock(clock);

    let outcome = monitor.poll_once().await;

    assert_eq!(outcome.status(), Status::Unknown);
    assert_eq!(outcome.selected_service_id, None);
    assert!(outcome.error.unwrap().contains("404"));
}

#[tokio::test]
async fn window_within_day_fetches_once() {
    let mock = morning_mock(Some(0)).await;
    let clock = FixedClock::new(at(15, 8, 0));
    let mut monitor = monitor(&mock, &clock);

    monitor.poll_once().await;
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn spawned_loop_polls_until_stopped() {
    let mock = morning_mock(Some(0)).await;
    let clock = FixedClock::new(at(15, 8, 0));
    let mut monitor = monitor(&mock, &clock);
    let (subscriber, mut rx) = ChannelSubscriber::channel();
    monitor.subscribe(subscriber);

    let handle = monitor.spawn();

    let first = rx.recv().await.unwrap();
    assert_eq!(first.current_status, Status::OnTime);

    mock.set_services(route(), vec![service("A", "0810", "0900", Some(12))])
        .await;
    let second = rx.recv().await.unwrap();
    assert_eq!(second.current_status, Status::MajorDelay);
    assert_eq!(second.previous_status, Some(Status::OnTime));

    handle.stop();
    handle.join().await;
    assert!(rx.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn polls_follow_the_interval() {
    let mock = morning_mock(Some(0)).await;
    let clock = FixedClock::new(at(15, 8, 0));
    let handle = monitor(&mock, &clock).spawn();

    tokio::time::sleep(Duration::from_secs(150)).await;
    handle.stop();
    handle.join().await;

    // Ticks at 0s, 60s and 120s.
    assert_eq!(mock.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn stop_abandons_in_flight_poll() {
    let mock = morning_mock(Some(0)).await;
    for _ in 0..4 {
        mock.fail_next(503).await;
    }
    let clock = FixedClock::new(at(15, 8, 0));
    let mut monitor = monitor_with(&mock, &clock, client(3));
    let (subscriber, mut rx) = ChannelSubscriber::channel();
    monitor.subscribe(subscriber);

    let handle = monitor.spawn();
    // First attempt fails at once; the poll is now sleeping in backoff.
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.stop();
    handle.join().await;

    assert_eq!(mock.call_count(), 1);
    assert!(rx.recv().await.is_none());
}

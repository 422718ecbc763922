//! Filtering timetable records down to one candidate service.

use std::fmt;

use tracing::{debug, trace, warn};

use crate::domain::{ClockTime, LocationCode, MINUTES_PER_DAY, forward_gap};
use crate::rtt::{CallPoint, ServiceRecord};

use super::options::SelectionOptions;
use super::rank::rank_candidates;
use super::window::SearchWindow;

/// A record that survived filtering, with its computed times.
///
/// Minutes are on the window's timeline (minutes since today's midnight,
/// possibly beyond 1440 for tomorrow's services).
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    /// The raw record this candidate was built from.
    pub record: &'a ServiceRecord,
    /// Normalized departure minute.
    pub departure_minute: u32,
    /// Normalized arrival minute at the destination.
    pub arrival_minute: u32,
    /// Destination time minus origin time, wrapped past midnight.
    pub duration_minutes: u32,
}

impl Candidate<'_> {
    pub fn service_uid(&self) -> &str {
        &self.record.service_uid
    }

    /// Departure as a clock time.
    pub fn departure_time(&self) -> Option<ClockTime> {
        minute_to_clock(self.departure_minute)
    }

    /// Arrival as a clock time.
    pub fn arrival_time(&self) -> Option<ClockTime> {
        minute_to_clock(self.arrival_minute)
    }
}

/// Why a record was not considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// No readable departure time.
    UnparseableDeparture,
    /// Departure (normalized) falls outside the window.
    OutsideWindow { departure_minute: u32 },
    /// The service does not call at the target destination.
    MissingDestination,
    /// The destination call point has no readable time.
    UnparseableArrival,
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclusion::UnparseableDeparture => f.write_str("unparseable departure time"),
            Exclusion::OutsideWindow { departure_minute } => {
                write!(f, "departure minute {departure_minute} outside window")
            }
            Exclusion::MissingDestination => f.write_str("does not call at destination"),
            Exclusion::UnparseableArrival => f.write_str("unparseable destination time"),
        }
    }
}

/// Full result of one selection pass.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    /// The window the pass used.
    pub window: SearchWindow,
    /// The winning candidate, if any.
    pub chosen: Option<Candidate<'a>>,
    /// How many records survived filtering.
    pub survivors: usize,
    /// Every excluded record, by service UID, with its reason.
    pub excluded: Vec<(&'a str, Exclusion)>,
}

/// Pick the best service to `destination` departing within the window.
///
/// Returns `None` when nothing qualifies; that is a normal outcome.
pub fn select_service<'a>(
    records: &'a [ServiceRecord],
    destination: &LocationCode,
    options: &SelectionOptions,
    now: ClockTime,
) -> Option<Candidate<'a>> {
    select_with_report(records, destination, options, now).chosen
}

/// Like [`select_service`], also reporting what was excluded and why.
pub fn select_with_report<'a>(
    records: &'a [ServiceRecord],
    destination: &LocationCode,
    options: &SelectionOptions,
    now: ClockTime,
) -> Selection<'a> {
    let window = SearchWindow::new(now, options);
    let mut survivors = Vec::with_capacity(records.len());
    let mut excluded = Vec::new();

    for record in records {
        match evaluate(record, destination, &window) {
            Ok(candidate) => survivors.push(candidate),
            Err(reason) => {
                log_exclusion(record, destination, reason);
                excluded.push((record.service_uid.as_str(), reason));
            }
        }
    }

    let survivor_count = survivors.len();
    let chosen = rank_candidates(survivors).into_iter().next();

    debug!(
        %destination,
        now = %now,
        earliest = window.earliest(),
        latest = window.latest(),
        records = records.len(),
        survivors = survivor_count,
        chosen = chosen.as_ref().map(|c| c.service_uid()),
        "selection pass complete"
    );

    Selection {
        window,
        chosen,
        survivors: survivor_count,
        excluded,
    }
}

/// Departure time of a record: booked, else real-time.
pub fn departure_time(record: &ServiceRecord) -> Option<ClockTime> {
    let detail = &record.location_detail;
    parse_first([
        detail.gbtt_booked_departure.as_deref(),
        detail.realtime_departure.as_deref(),
    ])
}

fn evaluate<'a>(
    record: &'a ServiceRecord,
    destination: &LocationCode,
    window: &SearchWindow,
) -> Result<Candidate<'a>, Exclusion> {
    let departure = departure_time(record).ok_or(Exclusion::UnparseableDeparture)?;
    let departure_minute = window.normalize(departure);
    if !window.contains(departure_minute) {
        return Err(Exclusion::OutsideWindow { departure_minute });
    }

    let detail = &record.location_detail;
    let dest_point = detail
        .destination
        .iter()
        .find(|p| p.is_at(destination))
        .ok_or(Exclusion::MissingDestination)?;
    let dest_time = call_point_time(dest_point).ok_or(Exclusion::UnparseableArrival)?;

    let origin_time = detail
        .origin
        .first()
        .and_then(call_point_time)
        .unwrap_or(departure);

    Ok(Candidate {
        record,
        departure_minute,
        arrival_minute: departure_minute.saturating_add(forward_gap(departure, dest_time)),
        duration_minutes: journey_minutes(origin_time, dest_time),
    })
}

/// Destination minus origin, plus a day if negative.
fn journey_minutes(origin: ClockTime, destination: ClockTime) -> u32 {
    let diff = destination.minute_of_day() as i32 - origin.minute_of_day() as i32;
    if diff < 0 {
        (diff + MINUTES_PER_DAY as i32) as u32
    } else {
        diff as u32
    }
}

/// A call point's time: working, else public, else real-time.
fn call_point_time(point: &CallPoint) -> Option<ClockTime> {
    parse_first([
        point.working_time.as_deref(),
        point.public_time.as_deref(),
        point.realtime.as_deref(),
    ])
}

/// First field that is present and parses.
fn parse_first<const N: usize>(fields: [Option<&str>; N]) -> Option<ClockTime> {
    fields
        .into_iter()
        .flatten()
        .find_map(|s| ClockTime::parse(s).ok())
}

fn minute_to_clock(minute: u32) -> Option<ClockTime> {
    let m = minute % MINUTES_PER_DAY;
    ClockTime::from_hm(m / 60, m % 60)
}

fn log_exclusion(record: &ServiceRecord, destination: &LocationCode, reason: Exclusion) {
    let uid = record.service_uid.as_str();
    match reason {
        Exclusion::MissingDestination => warn!(
            service = uid,
            %destination,
            "service has no destination call point matching target; check upstream data"
        ),
        Exclusion::OutsideWindow { departure_minute } => {
            debug!(service = uid, departure_minute, "excluded: outside window")
        }
        Exclusion::UnparseableDeparture | Exclusion::UnparseableArrival => {
            trace!(service = uid, %reason, "excluded: unreadable times")
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::rtt::LocationDetail;
    use proptest::prelude::*;

    fn clock(minute: u32) -> ClockTime {
        ClockTime::from_hm(minute / 60, minute % 60).unwrap()
    }

    fn service_at(dep: u32) -> ServiceRecord {
        let arr = (dep + 45) % MINUTES_PER_DAY;
        ServiceRecord {
            service_uid: format!("S{dep}"),
            location_detail: LocationDetail {
                gbtt_booked_departure: Some(format!("{:02}{:02}", dep / 60, dep % 60)),
                destination: vec![CallPoint {
                    crs: Some("KGX".into()),
                    public_time: Some(format!("{:02}{:02}", arr / 60, arr % 60)),
                    ..Default::default()
                }],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    proptest! {
        /// A single service is selected exactly when its normalized departure is in the window.
        #[test]
        fn window_inclusion(now in 0u32..1440, dep in 0u32..1440, min_after in 0u32..60, width in 0u32..180) {
            let options = SelectionOptions::new(min_after, width);
            let records = vec![service_at(dep)];
            let kgx = LocationCode::parse("KGX").unwrap();

            let chosen = select_service(&records, &kgx, &options, clock(now));
            let window = SearchWindow::new(clock(now), &options);
            let normalized = window.normalize(clock(dep));

            prop_assert_eq!(
                chosen.is_some(),
                window.earliest() <= normalized && normalized <= window.latest()
            );
        }

        /// With no matching destination, nothing is ever selected.
        #[test]
        fn wrong_destination_never_selected(now in 0u32..1440, deps in prop::collection::vec(0u32..1440, 0..10)) {
            let records: Vec<_> = deps.iter().map(|&d| service_at(d)).collect();
            let pad = LocationCode::parse("PAD").unwrap();
            let options = SelectionOptions::new(0, 1439);
            prop_assert!(select_service(&records, &pad, &options, clock(now)).is_none());
        }
    }
}

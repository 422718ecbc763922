//! Clock-time handling for timetable data.
//!
//! The timetable API reports times as 24-hour clock strings without a date
//! ("0810", "08:10", or working times with seconds like "081030"). This
//! module parses those into minutes since local midnight and provides the
//! day-rollover arithmetic the selector relies on.

use chrono::{NaiveTime, Timelike};
use std::fmt;

/// Minutes in one day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A time of day with minute resolution, independent of any date.
///
/// # Examples
///
/// ```
/// use train_status::domain::ClockTime;
///
/// let t = ClockTime::parse("0810").unwrap();
/// assert_eq!(t.minute_of_day(), 8 * 60 + 10);
/// assert_eq!(t.to_string(), "08:10");
///
/// // Colon-separated and working times with seconds are accepted
/// assert_eq!(ClockTime::parse("08:10").unwrap(), t);
/// assert_eq!(ClockTime::parse("081030").unwrap(), t);
/// assert_eq!(ClockTime::parse("0810H").unwrap(), t);
///
/// assert!(ClockTime::parse("2500").is_err());
/// assert!(ClockTime::parse("8:10").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClockTime(u16);

impl ClockTime {
    /// Build from hour and minute, if in range.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self((hour * 60 + minute) as u16))
    }

    /// Parse a 24-hour clock string.
    ///
    /// Accepted shapes are `HHMM`, `HH:MM`, `HHMMSS` and `HH:MM:SS`, each
    /// optionally followed by `H` (the half-minute marker used in working
    /// timetables). Seconds and half-minutes are truncated.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let s = s.trim();
        let s = s.strip_suffix('H').unwrap_or(s);

        let digits: Vec<u8> = match s.len() {
            4 | 6 => s.bytes().collect(),
            5 | 8 => {
                let bytes = s.as_bytes();
                if bytes[2] != b':' || (bytes.len() == 8 && bytes[5] != b':') {
                    return Err(TimeError::new("expected colon separators"));
                }
                bytes.iter().copied().filter(|&b| b != b':').collect()
            }
            _ => return Err(TimeError::new("expected HHMM or HH:MM format")),
        };

        let hour =
            parse_two_digits(&digits[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        let minute = parse_two_digits(&digits[2..4])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;

        if digits.len() == 6 {
            let second = parse_two_digits(&digits[4..6])
                .ok_or_else(|| TimeError::new("invalid second digits"))?;
            if second > 59 {
                return Err(TimeError::new("second must be 0-59"));
            }
        }

        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        Ok(Self((hour * 60 + minute) as u16))
    }

    /// Minutes since midnight (0..1440).
    pub fn minute_of_day(self) -> u32 {
        u32::from(self.0)
    }

    /// Returns the hour (0-23).
    pub fn hour(self) -> u32 {
        self.minute_of_day() / 60
    }

    /// Returns the minute (0-59).
    pub fn minute(self) -> u32 {
        self.minute_of_day() % 60
    }
}

impl From<NaiveTime> for ClockTime {
    fn from(t: NaiveTime) -> Self {
        Self((t.hour() * 60 + t.minute()) as u16)
    }
}

impl fmt::Debug for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClockTime({:02}:{:02})", self.hour(), self.minute())
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}

/// Place a clock minute on the timeline that starts at `now_minute`.
///
/// A time earlier than "now" is taken to be tomorrow, so it gains a day.
///
/// ```
/// use train_status::domain::normalize_rollover;
///
/// // 00:10 seen at 23:50 is tomorrow
/// assert_eq!(normalize_rollover(10, 23 * 60 + 50), 1450);
/// assert_eq!(normalize_rollover(8 * 60 + 10, 8 * 60), 490);
/// ```
pub fn normalize_rollover(minute: u32, now_minute: u32) -> u32 {
    if minute < now_minute {
        minute + MINUTES_PER_DAY
    } else {
        minute
    }
}

/// Minutes from `from` forward to `to`, wrapping past midnight.
///
/// Equal times give zero; a `to` earlier in the day than `from` is taken
/// to be the next day.
pub fn forward_gap(from: ClockTime, to: ClockTime) -> u32 {
    let from = from.minute_of_day() as i32;
    let to = to.minute_of_day() as i32;
    (to - from).rem_euclid(MINUTES_PER_DAY as i32) as u32
}

/// Signed minutes from `scheduled` to `actual`, choosing the shorter way round the clock.
///
/// Results lie in `-720..720`, so a train booked for 23:58 that leaves at
/// 00:03 is five minutes late rather than a day early.
pub fn signed_difference(scheduled: ClockTime, actual: ClockTime) -> i32 {
    let half_day = (MINUTES_PER_DAY / 2) as i32;
    let diff = actual.minute_of_day() as i32 - scheduled.minute_of_day() as i32;
    (diff + half_day).rem_euclid(MINUTES_PER_DAY as i32) - half_day
}

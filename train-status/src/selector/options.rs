//! Selection options.

use chrono::Duration;

/// How far ahead, and over what span, to look for a departure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOptions {
    /// Ignore departures sooner than this many minutes from now.
    pub min_after_minutes: u32,

    /// Width of the departure window, starting at `now + min_after_minutes`.
    pub window_minutes: u32,
}

impl SelectionOptions {
    pub fn new(min_after_minutes: u32, window_minutes: u32) -> Self {
        Self {
            min_after_minutes,
            window_minutes,
        }
    }

    pub fn with_min_after(mut self, minutes: u32) -> Self {
        self.min_after_minutes = minutes;
        self
    }

    pub fn with_window(mut self, minutes: u32) -> Self {
        self.window_minutes = minutes;
        self
    }

    /// Returns the minimum lead time as a Duration.
    pub fn min_after(&self) -> Duration {
        Duration::minutes(i64::from(self.min_after_minutes))
    }

    /// Returns the window width as a Duration.
    pub fn window(&self) -> Duration {
        Duration::minutes(i64::from(self.window_minutes))
    }
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            min_after_minutes: 20,
            window_minutes: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = SelectionOptions::default();
        assert_eq!(options.min_after_minutes, 20);
        assert_eq!(options.window_minutes, 60);
    }

    #[test]
    fn duration_methods() {
        let options = SelectionOptions::new(5, 120);
        assert_eq!(options.min_after(), Duration::minutes(5));
        assert_eq!(options.window(), Duration::minutes(120));
    }

    #[test]
    fn builders() {
        let options = SelectionOptions::default().with_min_after(0).with_window(30);
        assert_eq!(options, SelectionOptions::new(0, 30));
    }
}

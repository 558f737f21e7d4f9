//! Confirmation window around a schedule's start time.

use chrono::{NaiveTime, Timelike};

/// Minutes before and after the scheduled start during which a
/// confirmation is accepted.
pub const WINDOW_HALF_WIDTH_MIN: u32 = 5;

const LAST_MINUTE_OF_DAY: u32 = 24 * 60 - 1;

/// The `[start − 5min, start + 5min]` interval, inclusive on both ends.
///
/// Arithmetic is done in day-relative minutes; a start within 5 minutes of
/// midnight clamps the boundary to the same calendar day instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationWindow {
    opens_min: u32,
    closes_min: u32,
}

impl ConfirmationWindow {
    pub fn around(start: NaiveTime) -> Self {
        let start_min = start.hour() * 60 + start.minute();
        Self {
            opens_min: start_min.saturating_sub(WINDOW_HALF_WIDTH_MIN),
            closes_min: (start_min + WINDOW_HALF_WIDTH_MIN).min(LAST_MINUTE_OF_DAY),
        }
    }

    /// Both boundaries inclusive, compared at minute granularity.
    pub fn can_confirm_now(&self, now: NaiveTime) -> bool {
        let m = minute_of_day(now);
        m >= self.opens_min && m <= self.closes_min
    }

    pub fn is_expired(&self, now: NaiveTime) -> bool {
        minute_of_day(now) > self.closes_min
    }

    pub fn opens(&self) -> String {
        format_hhmm(self.opens_min)
    }

    pub fn closes(&self) -> String {
        format_hhmm(self.closes_min)
    }
}

fn minute_of_day(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

fn format_hhmm(minute: u32) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn window_is_inclusive_on_both_ends() {
        let w = ConfirmationWindow::around(t(9, 0));
        assert!(!w.can_confirm_now(t(8, 54)));
        assert!(w.can_confirm_now(t(8, 55)));
        assert!(w.can_confirm_now(t(9, 0)));
        assert!(w.can_confirm_now(t(9, 5)));
        assert!(!w.can_confirm_now(t(9, 6)));
    }

    #[test]
    fn expiry_starts_after_the_upper_bound() {
        let w = ConfirmationWindow::around(t(9, 0));
        assert!(!w.is_expired(t(9, 5)));
        assert!(w.is_expired(t(9, 6)));
        assert!(!w.is_expired(t(8, 0)));
    }

    #[test]
    fn seconds_within_the_closing_minute_still_count() {
        let w = ConfirmationWindow::around(t(9, 0));
        let closing = NaiveTime::from_hms_opt(9, 5, 59).unwrap();
        assert!(w.can_confirm_now(closing));
        assert!(!w.is_expired(closing));
    }

    #[test]
    fn clamps_at_start_of_day() {
        let w = ConfirmationWindow::around(t(0, 2));
        assert_eq!(w.opens(), "00:00");
        assert_eq!(w.closes(), "00:07");
        assert!(w.can_confirm_now(t(0, 0)));
    }

    #[test]
    fn clamps_at_end_of_day() {
        let w = ConfirmationWindow::around(t(23, 58));
        assert_eq!(w.opens(), "23:53");
        assert_eq!(w.closes(), "23:59");
        assert!(!w.is_expired(t(23, 59)));
    }

    #[test]
    fn formats_boundaries_as_hhmm() {
        let w = ConfirmationWindow::around(t(9, 0));
        assert_eq!(w.opens(), "08:55");
        assert_eq!(w.closes(), "09:05");
    }
}

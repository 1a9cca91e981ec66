//! Time utilities for rosterd
//!
//! Shift templates are defined as wall-clock times of day; everything else
//! in the engine works on absolute `NaiveDateTime` instants. The engine is
//! timezone-fixed: no zone conversion happens anywhere in this workspace.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Wall-clock time of day (minute resolution)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallClock {
    pub hour: u8,
    pub minute: u8,
}

impl WallClock {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour as u32, self.minute as u32, 0).unwrap()
    }

    pub fn from_naive_time(time: NaiveTime) -> Self {
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }

    /// Anchor this time of day to a concrete date
    pub fn on(self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.to_naive_time())
    }

    /// Returns minutes since midnight
    pub fn as_minutes_from_midnight(&self) -> u32 {
        (self.hour as u32) * 60 + self.minute as u32
    }
}

impl PartialOrd for WallClock {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WallClock {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_minutes_from_midnight()
            .cmp(&other.as_minutes_from_midnight())
    }
}

impl std::fmt::Display for WallClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Signed whole minutes from `from` to `to` (negative when `to` is earlier)
pub fn minutes_between(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    to.signed_duration_since(from).num_minutes()
}

/// Format a minute count as "Hh MMm" for log and CLI output
pub fn format_minutes(total: i64) -> String {
    let hours = total / 60;
    let minutes = total % 60;
    if hours > 0 {
        format!("{}h {:02}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn test_wall_clock_ordering() {
        let morning = WallClock::new(8, 0).unwrap();
        let noon = WallClock::new(12, 0).unwrap();
        let evening = WallClock::new(18, 30).unwrap();

        assert!(morning < noon);
        assert!(noon < evening);
        assert!(morning < evening);
    }

    #[test]
    fn test_wall_clock_rejects_out_of_range() {
        assert!(WallClock::new(24, 0).is_none());
        assert!(WallClock::new(12, 60).is_none());
    }

    #[test]
    fn test_anchor_to_date() {
        let clock = WallClock::new(22, 30).unwrap();
        let anchored = clock.on(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
        assert_eq!(anchored, dt(2026, 3, 14, 22, 30));
    }

    #[test]
    fn test_minutes_between() {
        let a = dt(2026, 3, 14, 8, 0);
        let b = dt(2026, 3, 14, 16, 30);
        assert_eq!(minutes_between(a, b), 510);
        assert_eq!(minutes_between(b, a), -510);
    }

    #[test]
    fn test_minutes_between_across_midnight() {
        let a = dt(2026, 3, 14, 22, 0);
        let b = dt(2026, 3, 15, 6, 0);
        assert_eq!(minutes_between(a, b), 480);
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(60), "1h 00m");
        assert_eq!(format_minutes(485), "8h 05m");
    }
}

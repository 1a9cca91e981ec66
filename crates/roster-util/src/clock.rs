//! Clock abstraction
//!
//! The engine never reads ambient time. Callers obtain `now` from a `Clock`
//! at the boundary (the CLI, a scheduler) and pass it into every operation,
//! which keeps the core a pure function of its inputs and makes every
//! time-dependent behavior testable with a `FixedClock`.

use chrono::{Local, NaiveDateTime};

/// Source of the current instant, fixed to the deployment timezone
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Real system clock in local time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock pinned to a single instant, for tests and replays
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn fixed_clock_returns_pinned_instant() {
        let instant = NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let clock = FixedClock(instant);
        assert_eq!(clock.now(), instant);
        assert_eq!(clock.now(), instant);
    }

    #[test]
    fn system_clock_advances() {
        let clock = SystemClock;
        let t1 = clock.now();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let t2 = clock.now();
        assert!(t2 > t1);
    }
}

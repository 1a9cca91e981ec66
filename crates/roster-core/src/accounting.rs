//! Work-time accounting, clamped to shift boundaries

use chrono::NaiveDateTime;
use roster_util::minutes_between;

use crate::ShiftSpan;

/// Minutes worked in a session, clamped to the shift span
///
/// Early arrival and late departure are discarded: the effective interval
/// is `[max(check_in, start), min(check_out ?? now, end)]`. While the
/// session is open the value is non-decreasing in `now`; once `check_out`
/// is set it freezes and later calls with a larger `now` cannot change it.
pub fn worked_minutes(
    check_in: NaiveDateTime,
    check_out: Option<NaiveDateTime>,
    span: ShiftSpan,
    now: NaiveDateTime,
) -> i64 {
    let effective_start = check_in.max(span.start);
    let effective_end = check_out.unwrap_or(now).min(span.end);
    minutes_between(effective_start, effective_end).max(0)
}

/// Minutes worked with no shift span to clamp against (legacy sessions
/// with an unknown assignment)
pub fn raw_worked_minutes(
    check_in: NaiveDateTime,
    check_out: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> i64 {
    minutes_between(check_in, check_out.unwrap_or(now)).max(0)
}

/// Shortfall against the nominal shift, in minutes
///
/// Measured from the nominal shift start, not the actual check-in: a late
/// arrival does not shrink the shortfall clock. Elapsed shift time is
/// `min(now, end) - start`, floored at zero before the shift begins.
pub fn shortage_minutes(span: ShiftSpan, worked: i64, now: NaiveDateTime) -> i64 {
    let elapsed = minutes_between(span.start, now.min(span.end)).max(0);
    (elapsed - worked).max(0)
}

//! Buffered eligibility windows and assignment resolution

use chrono::NaiveDateTime;
use roster_api::AttendanceWindow;
use roster_config::AttendancePolicy;
use roster_util::minutes_between;

use crate::{ScheduledShift, ShiftSpan};

/// Buffered check-in/check-out window for one shift span
///
/// Check-in is symmetric around nominal start (widened for short shifts so
/// the window is never narrower than the shift itself); checkout is
/// asymmetric: it opens a little before nominal end and stays open through
/// the late-checkout grace.
pub fn attendance_window(span: ShiftSpan, policy: &AttendancePolicy) -> AttendanceWindow {
    let buffer = policy.checkin_buffer_for(span.duration_minutes());
    AttendanceWindow {
        earliest_check_in: span.start - buffer,
        latest_check_in: span.start + buffer,
        earliest_check_out: span.end - policy.early_departure_tolerance(),
        latest_check_out: span.end + policy.late_checkout_grace(),
    }
}

/// Pick the assignment governing `now` from a staff member's schedule set.
///
/// Total over non-empty input:
/// 1. among shifts whose buffered envelope contains `now`, the one whose
///    nominal start is closest to `now` (earlier start wins ties);
/// 2. otherwise the upcoming shift with the nearest start;
/// 3. otherwise the most recently concluded shift.
///
/// Resolution never implies permission; validators check the window
/// separately.
pub fn resolve_active_or_nearest<'a>(
    shifts: &'a [ScheduledShift],
    policy: &AttendancePolicy,
    now: NaiveDateTime,
) -> Option<&'a ScheduledShift> {
    if shifts.is_empty() {
        return None;
    }

    let containing = shifts
        .iter()
        .filter(|s| attendance_window(s.span, policy).envelope_contains(now))
        .min_by_key(|s| (minutes_between(now, s.span.start).abs(), s.span.start));
    if containing.is_some() {
        return containing;
    }

    let upcoming = shifts
        .iter()
        .filter(|s| s.span.start > now)
        .min_by_key(|s| s.span.start);
    if upcoming.is_some() {
        return upcoming;
    }

    // Everything has ended; the latest end is the most recently concluded
    shifts.iter().max_by_key(|s| s.span.end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use roster_config::ShiftTemplate;
    use roster_store::ShiftAssignment;
    use roster_util::{AssignmentId, StaffId, TemplateId, WallClock};

    fn dt(d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn shift(id: &str, d: u32, start: (u8, u8), end: (u8, u8)) -> ScheduledShift {
        let date = NaiveDate::from_ymd_opt(2026, 3, d).unwrap();
        let template = ShiftTemplate {
            id: TemplateId::new(id),
            name: id.to_string(),
            start: WallClock::new(start.0, start.1).unwrap(),
            end: WallClock::new(end.0, end.1).unwrap(),
        };
        ScheduledShift {
            assignment: ShiftAssignment {
                id: AssignmentId::new(id),
                staff_id: StaffId::new("nurse-1"),
                date,
                template_id: template.id.clone(),
                unit: None,
                role: None,
            },
            shift_name: id.to_string(),
            span: ShiftSpan::of(date, &template),
        }
    }

    #[test]
    fn test_checkin_buffer_symmetric() {
        let policy = AttendancePolicy::default();
        let day = shift("day", 14, (8, 0), (16, 0));
        let window = attendance_window(day.span, &policy);

        assert_eq!(window.earliest_check_in, dt(14, 7, 30));
        assert_eq!(window.latest_check_in, dt(14, 8, 30));
    }

    #[test]
    fn test_checkout_window_asymmetric() {
        let policy = AttendancePolicy::default();
        let day = shift("day", 14, (8, 0), (16, 0));
        let window = attendance_window(day.span, &policy);

        assert_eq!(window.earliest_check_out, dt(14, 15, 45));
        assert_eq!(window.latest_check_out, dt(14, 17, 0));
    }

    #[test]
    fn test_short_shift_widens_checkin_buffer() {
        let policy = AttendancePolicy::default();
        let brief = shift("brief", 14, (7, 30), (8, 0));
        let window = attendance_window(brief.span, &policy);

        assert_eq!(window.earliest_check_in, dt(14, 6, 30));
        assert_eq!(window.latest_check_in, dt(14, 8, 30));
    }

    #[test]
    fn test_overnight_window_crosses_midnight() {
        let policy = AttendancePolicy::default();
        let night = shift("night", 14, (22, 0), (6, 0));
        let window = attendance_window(night.span, &policy);

        assert_eq!(window.earliest_check_in, dt(14, 21, 30));
        assert_eq!(window.latest_check_in, dt(14, 22, 30));
        assert_eq!(window.earliest_check_out, dt(15, 5, 45));
        assert_eq!(window.latest_check_out, dt(15, 7, 0));
    }

    #[test]
    fn test_resolution_is_total() {
        let policy = AttendancePolicy::default();
        let shifts = vec![shift("day", 14, (8, 0), (16, 0))];

        // Any instant resolves to something for a non-empty set
        for (d, h) in [(13, 0), (14, 3), (14, 12), (14, 23), (16, 12)] {
            assert!(resolve_active_or_nearest(&shifts, &policy, dt(d, h, 0)).is_some());
        }
        assert!(resolve_active_or_nearest(&[], &policy, dt(14, 12, 0)).is_none());
    }

    #[test]
    fn test_split_day_resolution() {
        // Morning hand-off 07:30-08:00 and evening hand-off 17:45-18:00
        let policy = AttendancePolicy::default();
        let shifts = vec![
            shift("morning", 14, (7, 30), (8, 0)),
            shift("evening", 14, (17, 45), (18, 0)),
        ];

        // During the morning window
        let governing = resolve_active_or_nearest(&shifts, &policy, dt(14, 7, 45)).unwrap();
        assert_eq!(governing.assignment.id, AssignmentId::new("morning"));

        // Midday: nothing contains 12:00, the evening shift is nearer ahead
        let governing = resolve_active_or_nearest(&shifts, &policy, dt(14, 12, 0)).unwrap();
        assert_eq!(governing.assignment.id, AssignmentId::new("evening"));

        // After both: most recently concluded
        let governing = resolve_active_or_nearest(&shifts, &policy, dt(14, 19, 0)).unwrap();
        assert_eq!(governing.assignment.id, AssignmentId::new("evening"));
    }

    #[test]
    fn test_overlapping_envelopes_prefer_closest_start() {
        let policy = AttendancePolicy::default();
        // Short shifts with widened buffers produce overlapping envelopes
        let shifts = vec![
            shift("first", 14, (8, 0), (8, 30)),
            shift("second", 14, (9, 0), (9, 30)),
        ];

        let governing = resolve_active_or_nearest(&shifts, &policy, dt(14, 8, 15)).unwrap();
        assert_eq!(governing.assignment.id, AssignmentId::new("first"));

        let governing = resolve_active_or_nearest(&shifts, &policy, dt(14, 8, 50)).unwrap();
        assert_eq!(governing.assignment.id, AssignmentId::new("second"));

        // Equidistant: earlier start wins
        let governing = resolve_active_or_nearest(&shifts, &policy, dt(14, 8, 30)).unwrap();
        assert_eq!(governing.assignment.id, AssignmentId::new("first"));
    }

    #[test]
    fn test_yesterdays_overnight_governs_early_morning() {
        let policy = AttendancePolicy::default();
        let shifts = vec![
            shift("night", 13, (22, 0), (6, 0)),
            shift("day", 14, (8, 0), (16, 0)),
        ];

        // 05:30 on the 14th is still inside the night shift's envelope
        let governing = resolve_active_or_nearest(&shifts, &policy, dt(14, 5, 30)).unwrap();
        assert_eq!(governing.assignment.id, AssignmentId::new("night"));

        // By 07:45 the day shift's check-in window has opened and is closer
        let governing = resolve_active_or_nearest(&shifts, &policy, dt(14, 7, 45)).unwrap();
        assert_eq!(governing.assignment.id, AssignmentId::new("day"));
    }
}

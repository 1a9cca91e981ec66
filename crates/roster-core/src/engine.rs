//! Check-in / check-out engine

use chrono::NaiveDateTime;
use roster_api::{
    CheckInOutcome, CheckOutOutcome, RejectReason, ResolvedShift, SessionStatus, StatusSnapshot,
};
use roster_config::{AttendancePolicy, ShiftCatalog};
use roster_store::{
    AttendanceSession, AuditEvent, AuditEventType, BeginSession, Ledger, OpenLookup,
    ShiftAssignment,
};
use roster_util::{minutes_between, StaffId};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::{
    attendance_window, raw_worked_minutes, resolve_active_or_nearest, shortage_minutes,
    worked_minutes, DailyScheduleSet, EngineError, EngineResult, ShiftSpan,
};

/// The attendance engine
///
/// A pure function of its inputs: `now` is passed into every operation and
/// all state lives behind the ledger.
pub struct AttendanceEngine {
    catalog: ShiftCatalog,
    policy: AttendancePolicy,
    ledger: Arc<dyn Ledger>,
}

impl AttendanceEngine {
    /// Create a new engine
    pub fn new(catalog: ShiftCatalog, policy: AttendancePolicy, ledger: Arc<dyn Ledger>) -> Self {
        info!(
            template_count = catalog.len(),
            "Attendance engine initialized"
        );

        Self {
            catalog,
            policy,
            ledger,
        }
    }

    /// Get the active policy
    pub fn policy(&self) -> &AttendancePolicy {
        &self.policy
    }

    /// Record a shift assignment in the roster
    pub fn record_assignment(
        &self,
        assignment: &ShiftAssignment,
        now: NaiveDateTime,
    ) -> EngineResult<()> {
        self.ledger.record_assignment(assignment)?;

        let _ = self.ledger.append_audit(AuditEvent::new(
            now,
            AuditEventType::AssignmentRecorded {
                assignment_id: assignment.id.clone(),
                staff_id: assignment.staff_id.clone(),
                date: assignment.date,
            },
        ));

        info!(
            assignment_id = %assignment.id,
            staff_id = %assignment.staff_id,
            date = %assignment.date,
            "Assignment recorded"
        );

        Ok(())
    }

    /// Validate and record a check-in
    pub fn check_in(
        &self,
        staff_id: &StaffId,
        now: NaiveDateTime,
        location: Option<String>,
    ) -> EngineResult<CheckInOutcome> {
        let schedule =
            DailyScheduleSet::load(self.ledger.as_ref(), &self.catalog, staff_id, now.date())?;

        let Some(shift) = resolve_active_or_nearest(schedule.shifts(), &self.policy, now) else {
            return Ok(self.reject_check_in(staff_id, now, RejectReason::NoSchedule));
        };

        let window = attendance_window(shift.span, &self.policy);
        if !window.check_in_contains(now) {
            let reason = if now < window.earliest_check_in {
                RejectReason::OutsideWindow {
                    minutes_until_open: Some(minutes_between(now, window.earliest_check_in)),
                    minutes_since_close: None,
                }
            } else {
                RejectReason::OutsideWindow {
                    minutes_until_open: None,
                    minutes_since_close: Some(minutes_between(window.latest_check_in, now)),
                }
            };
            return Ok(self.reject_check_in(staff_id, now, reason));
        }

        let session = AttendanceSession::open(
            staff_id.clone(),
            shift.assignment.id.clone(),
            now,
            location,
        );

        match self.ledger.begin_session(&session)? {
            BeginSession::Created => {
                let _ = self.ledger.append_audit(AuditEvent::new(
                    now,
                    AuditEventType::CheckInAccepted {
                        session_id: session.id.clone(),
                        staff_id: staff_id.clone(),
                        assignment_id: shift.assignment.id.clone(),
                    },
                ));

                info!(
                    staff_id = %staff_id,
                    session_id = %session.id,
                    assignment_id = %shift.assignment.id,
                    "Check-in accepted"
                );

                Ok(CheckInOutcome::Accepted {
                    session_id: session.id,
                    assignment_id: shift.assignment.id.clone(),
                    window,
                })
            }
            BeginSession::AlreadyOpen(existing) => Ok(self.reject_check_in(
                staff_id,
                now,
                RejectReason::AlreadyOpen {
                    session_id: existing.id.clone(),
                    opened_at: existing.check_in_at,
                },
            )),
            BeginSession::MultipleOpen { count } => {
                error!(
                    staff_id = %staff_id,
                    open_count = count,
                    "Open-session invariant violated; failing closed"
                );
                Err(EngineError::InvariantViolation {
                    staff_id: staff_id.clone(),
                    open_count: count,
                })
            }
        }
    }

    /// Validate and record a check-out
    pub fn check_out(
        &self,
        staff_id: &StaffId,
        now: NaiveDateTime,
        location: Option<String>,
    ) -> EngineResult<CheckOutOutcome> {
        let session = match self.ledger.open_session(staff_id)? {
            OpenLookup::None => {
                return Ok(self.reject_check_out(staff_id, now, RejectReason::NoOpenSession));
            }
            OpenLookup::Multiple { count } => {
                error!(
                    staff_id = %staff_id,
                    open_count = count,
                    "Open-session invariant violated; failing closed"
                );
                return Err(EngineError::InvariantViolation {
                    staff_id: staff_id.clone(),
                    open_count: count,
                });
            }
            OpenLookup::One(session) => *session,
        };

        // Eligibility is judged against the session's own assignment, not
        // whatever resolution would pick for now: the staff member may
        // already be inside a later shift's window.
        let span = self.span_for_session(&session)?;
        let mut overtime = false;
        if let Some(span) = span {
            let window = attendance_window(span, &self.policy);
            if now < window.earliest_check_out {
                return Ok(self.reject_check_out(
                    staff_id,
                    now,
                    RejectReason::TooEarly {
                        minutes_remaining: minutes_between(now, window.earliest_check_out),
                    },
                ));
            }
            // Past the grace the checkout still goes through, flagged
            overtime = now > window.latest_check_out;
        }

        let closed =
            self.ledger
                .close_session(&session.id, now, SessionStatus::Closed, location.as_deref())?;
        if !closed {
            // Lost the race: closed elsewhere between our read and write
            debug!(session_id = %session.id, "Session no longer open at close time");
            return Ok(self.reject_check_out(staff_id, now, RejectReason::NoOpenSession));
        }

        let worked = match span {
            Some(span) => worked_minutes(session.check_in_at, Some(now), span, now),
            None => raw_worked_minutes(session.check_in_at, Some(now), now),
        };

        let _ = self.ledger.append_audit(AuditEvent::new(
            now,
            AuditEventType::CheckOutAccepted {
                session_id: session.id.clone(),
                staff_id: staff_id.clone(),
                worked_minutes: worked,
                overtime,
            },
        ));

        info!(
            staff_id = %staff_id,
            session_id = %session.id,
            worked_minutes = worked,
            overtime,
            "Check-out accepted"
        );

        Ok(CheckOutOutcome::Accepted {
            session_id: session.id,
            worked_minutes: worked,
            overtime,
        })
    }

    /// Attendance status for one staff member at a reference instant
    pub fn status(&self, staff_id: &StaffId, now: NaiveDateTime) -> EngineResult<StatusSnapshot> {
        let schedule =
            DailyScheduleSet::load(self.ledger.as_ref(), &self.catalog, staff_id, now.date())?;
        let governing = resolve_active_or_nearest(schedule.shifts(), &self.policy, now);

        let resolved = governing.map(|s| ResolvedShift {
            assignment_id: s.assignment.id.clone(),
            template_id: s.assignment.template_id.clone(),
            shift_name: s.shift_name.clone(),
            start: s.span.start,
            end: s.span.end,
            window: attendance_window(s.span, &self.policy),
        });

        let open_session = match self.ledger.open_session(staff_id)? {
            OpenLookup::None => None,
            OpenLookup::One(session) => Some(*session),
            OpenLookup::Multiple { count } => {
                error!(
                    staff_id = %staff_id,
                    open_count = count,
                    "Open-session invariant violated; failing closed"
                );
                return Err(EngineError::InvariantViolation {
                    staff_id: staff_id.clone(),
                    open_count: count,
                });
            }
        };

        let (live_worked_minutes, session_span) = match &open_session {
            Some(session) => match self.span_for_session(session)? {
                Some(span) => (
                    worked_minutes(session.check_in_at, None, span, now),
                    Some(span),
                ),
                None => (raw_worked_minutes(session.check_in_at, None, now), None),
            },
            None => (0, None),
        };

        // Shortfall measures against the open session's shift when there is
        // one; otherwise against the governing assignment
        let shortage = match (&open_session, session_span) {
            (Some(_), Some(span)) => Some(shortage_minutes(span, live_worked_minutes, now)),
            (Some(_), None) => None,
            (None, _) => governing.map(|s| shortage_minutes(s.span, 0, now)),
        };

        Ok(StatusSnapshot {
            staff_id: staff_id.clone(),
            at: now,
            resolved,
            open_session: open_session.map(|s| s.to_info()),
            live_worked_minutes,
            shortage_minutes: shortage,
        })
    }

    /// Shift span of the assignment a session was opened against, if it can
    /// still be resolved
    pub(crate) fn span_for_session(
        &self,
        session: &AttendanceSession,
    ) -> EngineResult<Option<ShiftSpan>> {
        let Some(assignment_id) = &session.assignment_id else {
            return Ok(None);
        };
        let Some(assignment) = self.ledger.assignment(assignment_id)? else {
            debug!(assignment_id = %assignment_id, "Session assignment not in roster");
            return Ok(None);
        };
        let Some(template) = self.catalog.get(&assignment.template_id) else {
            debug!(template_id = %assignment.template_id, "Session template not in catalog");
            return Ok(None);
        };
        Ok(Some(ShiftSpan::of(assignment.date, template)))
    }

    fn reject_check_in(
        &self,
        staff_id: &StaffId,
        now: NaiveDateTime,
        reason: RejectReason,
    ) -> CheckInOutcome {
        let _ = self.ledger.append_audit(AuditEvent::new(
            now,
            AuditEventType::CheckInRejected {
                staff_id: staff_id.clone(),
                reason: format!("{:?}", reason),
            },
        ));
        debug!(staff_id = %staff_id, reason = ?reason, "Check-in rejected");
        CheckInOutcome::Rejected { reason }
    }

    fn reject_check_out(
        &self,
        staff_id: &StaffId,
        now: NaiveDateTime,
        reason: RejectReason,
    ) -> CheckOutOutcome {
        let _ = self.ledger.append_audit(AuditEvent::new(
            now,
            AuditEventType::CheckOutRejected {
                staff_id: staff_id.clone(),
                reason: format!("{:?}", reason),
            },
        ));
        debug!(staff_id = %staff_id, reason = ?reason, "Check-out rejected");
        CheckOutOutcome::Rejected { reason }
    }
}

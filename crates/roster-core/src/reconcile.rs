//! Reconciliation sweep for abandoned sessions

use chrono::NaiveDateTime;
use roster_api::{AutoClosedSession, ReconciliationReport, SessionStatus};
use roster_config::{AttendancePolicy, ShiftCatalog};
use roster_store::{AttendanceSession, AuditEvent, AuditEventType, Ledger};
use std::sync::Arc;
use tracing::{debug, info};

use crate::{EngineResult, ShiftSpan};

/// Closes sessions abandoned without a checkout
///
/// Safe to run concurrently with live traffic: each close is conditioned on
/// the session still being open at write time, and a second sweep over
/// unchanged storage closes nothing.
pub struct Reconciler {
    catalog: ShiftCatalog,
    policy: AttendancePolicy,
    ledger: Arc<dyn Ledger>,
}

impl Reconciler {
    pub fn new(catalog: ShiftCatalog, policy: AttendancePolicy, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            catalog,
            policy,
            ledger,
        }
    }

    /// Sweep sessions whose check-in is older than the staleness threshold
    pub fn run(&self, as_of: NaiveDateTime) -> EngineResult<ReconciliationReport> {
        let cutoff = as_of - self.policy.staleness_threshold();
        let stale = self.ledger.stale_open_sessions(cutoff)?;

        debug!(
            candidates = stale.len(),
            cutoff = %cutoff,
            "Reconciliation sweep started"
        );

        let mut sessions = Vec::new();
        for session in stale {
            let check_out_at = self.estimated_checkout(&session, as_of)?;

            // The check-in location stands in for the missing checkout
            // location, unless an independent value already exists.
            let closed = self.ledger.close_session(
                &session.id,
                check_out_at,
                SessionStatus::AutoClosed,
                session.location_in.as_deref(),
            )?;
            if !closed {
                // Checked out live between our read and this write
                debug!(session_id = %session.id, "Session closed in the meantime, skipping");
                continue;
            }

            let _ = self.ledger.append_audit(AuditEvent::new(
                as_of,
                AuditEventType::SessionAutoClosed {
                    session_id: session.id.clone(),
                    staff_id: session.staff_id.clone(),
                    check_out_at,
                },
            ));

            info!(
                session_id = %session.id,
                staff_id = %session.staff_id,
                check_in_at = %session.check_in_at,
                check_out_at = %check_out_at,
                "Stale session auto-closed"
            );

            sessions.push(AutoClosedSession {
                session_id: session.id,
                staff_id: session.staff_id,
                assignment_id: session.assignment_id,
                check_in_at: session.check_in_at,
                check_out_at,
            });
        }

        let closed_count = sessions.len();
        let _ = self.ledger.append_audit(AuditEvent::new(
            as_of,
            AuditEventType::SweepCompleted { closed_count },
        ));

        info!(closed_count, "Reconciliation sweep completed");

        Ok(ReconciliationReport {
            as_of,
            closed_count,
            sessions,
        })
    }

    /// Best estimate of when the staff member actually left: the nominal
    /// shift end when the assignment is known, otherwise check-in plus the
    /// fallback span, capped at the sweep instant
    fn estimated_checkout(
        &self,
        session: &AttendanceSession,
        as_of: NaiveDateTime,
    ) -> EngineResult<NaiveDateTime> {
        if let Some(assignment_id) = &session.assignment_id {
            if let Some(assignment) = self.ledger.assignment(assignment_id)? {
                if let Some(template) = self.catalog.get(&assignment.template_id) {
                    return Ok(ShiftSpan::of(assignment.date, template).end);
                }
            }
        }

        Ok((session.check_in_at + self.policy.fallback_close()).min(as_of))
    }
}

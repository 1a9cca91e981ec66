//! Ledger trait definitions

use chrono::{NaiveDate, NaiveDateTime};
use roster_api::SessionStatus;
use roster_util::{AssignmentId, SessionId, StaffId};

use crate::{AttendanceSession, AuditEvent, BeginSession, LedgerResult, OpenLookup, ShiftAssignment};

/// The attendance ledger: sessions, roster assignments, and audit trail
pub trait Ledger: Send + Sync {
    // Audit log

    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> LedgerResult<()>;

    /// Get recent audit events
    fn recent_audits(&self, limit: usize) -> LedgerResult<Vec<AuditEvent>>;

    // Roster

    /// Record (or replace) a shift assignment
    fn record_assignment(&self, assignment: &ShiftAssignment) -> LedgerResult<()>;

    /// Look up one assignment by ID
    fn assignment(&self, id: &AssignmentId) -> LedgerResult<Option<ShiftAssignment>>;

    /// All assignments for a staff member with dates in `from..=to`,
    /// ordered by date
    fn assignments_between(
        &self,
        staff_id: &StaffId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<Vec<ShiftAssignment>>;

    // Sessions

    /// Insert an open session, but only if the staff member has none open.
    /// The open-check and insert run as one transaction; this is what makes
    /// two concurrent check-ins from the same staff member safe.
    fn begin_session(&self, session: &AttendanceSession) -> LedgerResult<BeginSession>;

    /// The staff member's current open session (most recent check-in with no
    /// checkout), detecting invariant violations
    fn open_session(&self, staff_id: &StaffId) -> LedgerResult<OpenLookup>;

    /// Set checkout on a session, guarded on it still being open.
    /// Returns false when the session was already closed (or unknown), in
    /// which case nothing was written. A provided `location_out` is only
    /// stored when the session has no independent value already.
    fn close_session(
        &self,
        id: &SessionId,
        at: NaiveDateTime,
        status: SessionStatus,
        location_out: Option<&str>,
    ) -> LedgerResult<bool>;

    /// Open sessions whose check-in is strictly older than `older_than`,
    /// oldest first
    fn stale_open_sessions(&self, older_than: NaiveDateTime) -> LedgerResult<Vec<AttendanceSession>>;

    /// Look up one session by ID
    fn session(&self, id: &SessionId) -> LedgerResult<Option<AttendanceSession>>;

    /// Most recent sessions for a staff member, newest first
    fn sessions_for(&self, staff_id: &StaffId, limit: usize) -> LedgerResult<Vec<AttendanceSession>>;

    // Health

    /// Check if the ledger is healthy
    fn is_healthy(&self) -> bool;
}

//! Ledger records: shift assignments and attendance sessions

use chrono::{NaiveDate, NaiveDateTime};
use roster_api::{SessionInfo, SessionStatus};
use roster_util::{AssignmentId, SessionId, StaffId, TemplateId};
use serde::{Deserialize, Serialize};

/// One staff member scheduled to one shift template on one date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftAssignment {
    pub id: AssignmentId,
    pub staff_id: StaffId,
    pub date: NaiveDate,
    pub template_id: TemplateId,
    pub unit: Option<String>,
    pub role: Option<String>,
}

/// One attendance session bound to (staff, assignment)
///
/// At most one session per staff member is open at any time; the ledger
/// enforces this inside `begin_session`. Sessions are never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSession {
    pub id: SessionId,
    pub staff_id: StaffId,
    pub assignment_id: Option<AssignmentId>,
    pub check_in_at: NaiveDateTime,
    pub check_out_at: Option<NaiveDateTime>,
    pub status: SessionStatus,
    pub location_in: Option<String>,
    pub location_out: Option<String>,
}

impl AttendanceSession {
    /// Fresh open session at check-in
    pub fn open(
        staff_id: StaffId,
        assignment_id: AssignmentId,
        check_in_at: NaiveDateTime,
        location_in: Option<String>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            staff_id,
            assignment_id: Some(assignment_id),
            check_in_at,
            check_out_at: None,
            status: SessionStatus::Open,
            location_in,
            location_out: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.check_out_at.is_none()
    }

    pub fn to_info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.id.clone(),
            staff_id: self.staff_id.clone(),
            assignment_id: self.assignment_id.clone(),
            check_in_at: self.check_in_at,
            check_out_at: self.check_out_at,
            status: self.status,
            location_in: self.location_in.clone(),
            location_out: self.location_out.clone(),
        }
    }
}

/// Outcome of the transactional check-in insert
#[derive(Debug)]
pub enum BeginSession {
    /// Inserted; the staff member had no open session
    Created,
    /// Not inserted; this open session already exists
    AlreadyOpen(Box<AttendanceSession>),
    /// Not inserted; storage already violates the one-open-session invariant
    MultipleOpen { count: usize },
}

/// Result of looking up a staff member's current open session
#[derive(Debug)]
pub enum OpenLookup {
    None,
    One(Box<AttendanceSession>),
    /// Storage violates the one-open-session invariant
    Multiple { count: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn open_session_starts_open() {
        let session = AttendanceSession::open(
            StaffId::new("nurse-1"),
            AssignmentId::new("a-1"),
            NaiveDate::from_ymd_opt(2026, 3, 14)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            Some("ward-3".into()),
        );

        assert!(session.is_open());
        assert_eq!(session.status, SessionStatus::Open);
        assert!(session.check_out_at.is_none());
        assert!(session.location_out.is_none());
    }
}

//! Shared types for the rosterd API

use chrono::NaiveDateTime;
use roster_util::{AssignmentId, SessionId, StaffId, TemplateId};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an attendance session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Checked in, not yet checked out
    Open,
    /// Closed by a staff checkout
    Closed,
    /// Closed by the reconciliation sweep
    AutoClosed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Open => "open",
            SessionStatus::Closed => "closed",
            SessionStatus::AutoClosed => "auto_closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(SessionStatus::Open),
            "closed" => Some(SessionStatus::Closed),
            "auto_closed" => Some(SessionStatus::AutoClosed),
            _ => None,
        }
    }
}

/// Buffered eligibility window around one shift assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceWindow {
    pub earliest_check_in: NaiveDateTime,
    pub latest_check_in: NaiveDateTime,
    pub earliest_check_out: NaiveDateTime,
    pub latest_check_out: NaiveDateTime,
}

impl AttendanceWindow {
    /// Whole buffered envelope, bounds inclusive
    pub fn envelope_contains(&self, at: NaiveDateTime) -> bool {
        self.earliest_check_in <= at && at <= self.latest_check_out
    }

    /// Check-in eligibility, bounds inclusive
    pub fn check_in_contains(&self, at: NaiveDateTime) -> bool {
        self.earliest_check_in <= at && at <= self.latest_check_in
    }
}

/// Structured reasons for rejecting a check-in or check-out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum RejectReason {
    /// No assignment could be resolved for this staff member around now
    NoSchedule,
    /// Now falls outside the check-in window of the governing assignment
    OutsideWindow {
        /// Minutes until the window opens, when too early
        minutes_until_open: Option<i64>,
        /// Minutes since the window closed, when too late
        minutes_since_close: Option<i64>,
    },
    /// The staff member already has an open session
    AlreadyOpen {
        session_id: SessionId,
        opened_at: NaiveDateTime,
    },
    /// No open session exists to check out of
    NoOpenSession,
    /// Checkout attempted before the earliest permitted departure
    TooEarly { minutes_remaining: i64 },
}

/// Result of a check-in request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CheckInOutcome {
    Accepted {
        session_id: SessionId,
        assignment_id: AssignmentId,
        window: AttendanceWindow,
    },
    Rejected { reason: RejectReason },
}

/// Result of a check-out request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CheckOutOutcome {
    Accepted {
        session_id: SessionId,
        worked_minutes: i64,
        /// Checkout happened after the late-checkout grace expired
        overtime: bool,
    },
    Rejected { reason: RejectReason },
}

/// Session details for status output and ledger listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub staff_id: StaffId,
    pub assignment_id: Option<AssignmentId>,
    pub check_in_at: NaiveDateTime,
    pub check_out_at: Option<NaiveDateTime>,
    pub status: SessionStatus,
    pub location_in: Option<String>,
    pub location_out: Option<String>,
}

/// The assignment resolved as governing "now", with its window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedShift {
    pub assignment_id: AssignmentId,
    pub template_id: TemplateId,
    pub shift_name: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub window: AttendanceWindow,
}

/// Per-staff attendance status at a reference instant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub staff_id: StaffId,
    pub at: NaiveDateTime,
    /// Governing assignment, if any schedule exists around `at`
    pub resolved: Option<ResolvedShift>,
    pub open_session: Option<SessionInfo>,
    /// Zero when no session is open
    pub live_worked_minutes: i64,
    /// None when no shift span is known to measure against
    pub shortage_minutes: Option<i64>,
}

/// One session closed by the reconciliation sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoClosedSession {
    pub session_id: SessionId,
    pub staff_id: StaffId,
    pub assignment_id: Option<AssignmentId>,
    pub check_in_at: NaiveDateTime,
    pub check_out_at: NaiveDateTime,
}

/// Result of one reconciliation sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub as_of: NaiveDateTime,
    pub closed_count: usize,
    pub sessions: Vec<AutoClosedSession>,
}

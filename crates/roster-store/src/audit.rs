//! Audit event types

use chrono::{NaiveDate, NaiveDateTime};
use roster_util::{AssignmentId, SessionId, StaffId};
use serde::{Deserialize, Serialize};

/// Types of audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Configuration loaded
    PolicyLoaded { template_count: usize },

    /// Assignment recorded in the roster
    AssignmentRecorded {
        assignment_id: AssignmentId,
        staff_id: StaffId,
        date: NaiveDate,
    },

    /// Check-in accepted
    CheckInAccepted {
        session_id: SessionId,
        staff_id: StaffId,
        assignment_id: AssignmentId,
    },

    /// Check-in rejected
    CheckInRejected { staff_id: StaffId, reason: String },

    /// Check-out accepted
    CheckOutAccepted {
        session_id: SessionId,
        staff_id: StaffId,
        worked_minutes: i64,
        overtime: bool,
    },

    /// Check-out rejected
    CheckOutRejected { staff_id: StaffId, reason: String },

    /// Session closed by the reconciliation sweep
    SessionAutoClosed {
        session_id: SessionId,
        staff_id: StaffId,
        check_out_at: NaiveDateTime,
    },

    /// Reconciliation sweep finished
    SweepCompleted { closed_count: usize },
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp, supplied by the caller's clock
    pub timestamp: NaiveDateTime,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(at: NaiveDateTime, event: AuditEventType) -> Self {
        Self {
            id: 0, // Will be set by the ledger
            timestamp: at,
            event,
        }
    }
}

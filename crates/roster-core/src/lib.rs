//! Attendance engine for rosterd
//!
//! This crate is the heart of rosterd, containing:
//! - Shift spans: date-anchored absolute bounds, overnight-aware
//! - Window resolution (which assignment governs "now")
//! - Check-in / check-out validation against the ledger
//! - Work-time accounting clamped to shift boundaries
//! - The reconciliation sweep for abandoned sessions
//!
//! Every operation takes `now` explicitly; nothing here reads ambient time.

mod accounting;
mod engine;
mod reconcile;
mod schedule;
mod window;

pub use accounting::*;
pub use engine::*;
pub use reconcile::*;
pub use schedule::*;
pub use window::*;

use roster_store::LedgerError;
use roster_util::StaffId;
use thiserror::Error;

/// Engine errors
///
/// User-correctable rejections are not errors; they travel as data inside
/// the outcome types. These are the failures the engine cannot act on.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Storage holds more than one open session for a staff member; the
    /// operation fails closed rather than guessing which is authoritative
    #[error("{open_count} open sessions found for staff {staff_id}")]
    InvariantViolation {
        staff_id: StaffId,
        open_count: usize,
    },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

pub type EngineResult<T> = Result<T, EngineError>;

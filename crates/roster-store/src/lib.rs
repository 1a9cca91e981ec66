//! Persistence layer for rosterd
//!
//! Provides:
//! - The AttendanceLedger trait (sessions + roster assignments)
//! - Audit log (append-only)
//! - SQLite implementation with transactional check-in and conditional close

mod audit;
mod records;
mod sqlite;
mod traits;

pub use audit::*;
pub use records::*;
pub use sqlite::*;
pub use traits::*;

use thiserror::Error;

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<rusqlite::Error> for LedgerError {
    fn from(e: rusqlite::Error) -> Self {
        LedgerError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

//! Contract types for the rosterd attendance engine
//!
//! These are the types crossing the engine boundary: check-in/check-out
//! outcomes with structured rejection reasons, the per-staff status
//! snapshot, and the reconciliation report. No transport is prescribed;
//! the CLI serializes these as JSON.

mod types;

pub use types::*;

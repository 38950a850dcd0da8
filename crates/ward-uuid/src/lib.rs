//! Record identifiers and sharded-path utilities.
//!
//! The file record store keeps every patient under a sharded directory derived from the
//! patient's identifier. To keep path derivation deterministic, identifiers use a *canonical*
//! representation: **32 lowercase hexadecimal characters** (no hyphens).
//!
//! This crate provides:
//! - [`RecordId`], a wrapper that guarantees the canonical format once constructed.
//! - The sharding rule used to derive a record directory from an identifier.
//!
//! ## Sharded directory layout
//! For a canonical identifier `u`, records live under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`
//!
//! Example:
//! `patient_data/patients/55/0e/550e8400e29b41d4a716446655440000/`

mod record_id;

pub use record_id::{RecordId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;

//! Error types for the storage layer

use thiserror::Error;

use crate::domain::PatientId;

/// Errors that can occur in the patient store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A record with this email already exists
    #[error("duplicate email: {0}")]
    DuplicateEmail(String),

    /// Patient not found
    #[error("patient not found: {0}")]
    PatientNotFound(PatientId),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

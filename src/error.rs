//! Error types for itstore
//!
//! Provides the error taxonomy every storage operation reports, plus the
//! PSA status codes that crypto and provisioning callers compare against.

use thiserror::Error;

/// Result type alias using ItsError
pub type Result<T> = std::result::Result<T, ItsError>;

/// PSA status code for a successful operation
pub const PSA_SUCCESS: i32 = 0;

/// Unified error type for itstore operations
///
/// Any error means the operation did not happen: there is no partial
/// success reporting.
#[derive(Debug, Error)]
pub enum ItsError {
    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("No record stored under this uid")]
    NotFound,

    #[error("Corrupt record header: {0}")]
    CorruptHeader(String),

    // -------------------------------------------------------------------------
    // Argument Errors
    // -------------------------------------------------------------------------
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid handle: uid 0 is reserved")]
    InvalidHandle,

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Insufficient storage: {0}")]
    InsufficientStorage(String),

    #[error("Storage failure: {0}")]
    StorageFailure(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ItsError {
    /// PSA status code for this error
    ///
    /// Values match `psa/error.h`:
    /// - `PSA_ERROR_DOES_NOT_EXIST` (-140)
    /// - `PSA_ERROR_DATA_CORRUPT` (-152)
    /// - `PSA_ERROR_INVALID_ARGUMENT` (-135)
    /// - `PSA_ERROR_INVALID_HANDLE` (-136)
    /// - `PSA_ERROR_INSUFFICIENT_STORAGE` (-142)
    /// - `PSA_ERROR_STORAGE_FAILURE` (-146)
    pub fn status_code(&self) -> i32 {
        match self {
            ItsError::NotFound => -140,
            ItsError::CorruptHeader(_) => -152,
            ItsError::InvalidArgument(_) | ItsError::Config(_) => -135,
            ItsError::InvalidHandle => -136,
            ItsError::InsufficientStorage(_) => -142,
            ItsError::StorageFailure(_) => -146,
        }
    }
}

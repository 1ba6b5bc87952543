//! Error types shared across the account directory.

use thiserror::Error;

/// Failures surfaced by directory operations.
///
/// The variants are deliberately coarse: callers map them onto transport
/// status codes, so each variant corresponds to exactly one class of
/// response.
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// Input failed validation before reaching storage.
    #[error("{0}")]
    Validation(String),

    /// The requested user does not exist.
    #[error("User not found")]
    NotFound,

    /// The username is on the screened-names list.
    #[error("Username is reserved")]
    Blacklisted,

    /// The backing store could not be reached.
    #[error("Storage unreachable: {0}")]
    Connection(String),

    /// Anything else that went wrong inside the directory.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience alias for directory results.
pub type Result<T> = std::result::Result<T, DirectoryError>;

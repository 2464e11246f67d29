//! Error types for listkeeper
//!
//! This module provides the error handling for the library, including:
//! - Domain-specific error types (Storage, Probe)
//! - Retryability classification for transient transport failures
//!
//! Probe failures are deliberately *not* part of the top-level [`Error`]:
//! a domain that fails every probe strategy is reported as blocked, not as
//! an error (see the availability module).

use thiserror::Error;

/// Result type alias for listkeeper operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for listkeeper
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "availability.batch_size")
        key: Option<String>,
    },

    /// Remote file storage error
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filename rejected by the naming rules (charset, traversal, extension)
    #[error("invalid filename: {0}")]
    InvalidFilename(String),

    /// Attempted to delete or overwrite a protected file
    #[error("file is protected: {0}")]
    ProtectedFile(String),

    /// Operation requires a list-typed file
    #[error("not a list file: {0}")]
    NotListFile(String),

    /// No domains could be extracted from the given content
    #[error("no domains found in content")]
    NoDomainsFound,

    /// An availability check is already running
    #[error("availability check already in progress")]
    CheckInProgress,

    /// Malformed version string
    #[error("invalid version: {0}")]
    InvalidVersion(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Remote file storage errors
///
/// The storage API is an external collaborator; these variants map its
/// failure modes (see the `api` module for the HTTP mapping).
#[derive(Debug, Error)]
pub enum StorageError {
    /// Session expired or credentials rejected
    #[error("unauthorized")]
    Unauthorized,

    /// File does not exist on the remote side
    #[error("file not found: {0}")]
    NotFound(String),

    /// Remote side refused the operation
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Transport-level failure (connection refused, timeout, reset)
    #[error("transport error: {0}")]
    Transport(String),

    /// Response did not match the expected command envelope
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Probe-level errors for a single accessibility strategy
///
/// Recovered internally by falling through to the next strategy; a domain
/// only surfaces as "blocked" once every strategy has failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// Strategy did not settle within its timeout
    #[error("probe timed out")]
    Timeout,

    /// Network-level failure (refused, reset, DNS, TLS)
    #[error("probe failed: {0}")]
    Failed(String),

    /// Outer cancellation aborted the probe; not counted as a failure
    #[error("probe cancelled")]
    Cancelled,
}

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (timeouts, connection resets) should return `true`.
/// Permanent failures (unauthorized, not found, malformed response) should
/// return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for StorageError {
    fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Transport(_))
    }
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Storage(e) => e.is_retryable(),
            Error::Network(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

//! Error types for Reelkit
//!
//! This module defines all error types used throughout the engine,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Generic message used when a backend rejection carries no readable body.
pub const GENERIC_BACKEND_MESSAGE: &str = "An error occurred";

/// Message used when the backend could not be reached at all.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";

/// Main error type for Reelkit operations
///
/// Covers access gating, the legal ownership gate, authentication,
/// backend failures, edit-history state machine violations, and the
/// ambient failures of configuration, storage, and serialization.
#[derive(Error, Debug)]
pub enum ReelkitError {
    /// Neither Pro access nor a spare credit was available
    #[error("Insufficient access: an AI credit or a Pro subscription is required")]
    InsufficientAccess,

    /// Watermark removal was requested without confirming ownership
    #[error("Ownership of the media must be confirmed before removing a watermark")]
    OwnershipNotConfirmed,

    /// No token, or the backend rejected the token (401)
    #[error("Authentication error: {0}")]
    Unauthenticated(String),

    /// Network failure or timeout while talking to the backend
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Backend answered with a non-success status
    #[error("Backend rejected request (status {status}): {message}")]
    BackendRejected {
        /// HTTP-like status code returned by the backend
        status: u16,
        /// Human-readable message extracted from the response body
        message: String,
    },

    /// Edit-history operation attempted from a state that does not allow it
    #[error("Invalid edit-history transition: {0}")]
    InvalidTransition(String),

    /// The request was abandoned before it completed
    #[error("Request cancelled")]
    Cancelled,

    /// A result arrived for a media session that has since been replaced or cleared
    #[error("Media session changed before the result arrived")]
    StaleSession,

    /// Caller supplied an unusable argument (e.g. empty content)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Publish plan cannot be committed in its current shape
    #[error("Invalid publish plan: {0}")]
    InvalidPublishPlan(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Durable storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl ReelkitError {
    /// Returns the typed error inside an `anyhow::Error`, if there is one
    ///
    /// # Examples
    ///
    /// ```
    /// use reelkit::error::ReelkitError;
    ///
    /// let err = anyhow::Error::from(ReelkitError::InsufficientAccess);
    /// assert!(matches!(
    ///     ReelkitError::classify(&err),
    ///     Some(ReelkitError::InsufficientAccess)
    /// ));
    /// ```
    pub fn classify(err: &anyhow::Error) -> Option<&ReelkitError> {
        err.downcast_ref::<ReelkitError>()
    }

    /// Returns `true` for errors that mean the held token is no longer valid
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated(_))
    }
}

/// Result type alias for Reelkit operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

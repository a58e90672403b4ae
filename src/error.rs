//! Error types for DomAssist
//!
//! This module defines all error types used throughout the widget core,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for DomAssist operations
///
/// Covers the whole failure taxonomy of a chat turn (validation, consent,
/// network, persistence) plus the plumbing errors raised while loading
/// configuration or talking to storage.
#[derive(Error, Debug)]
pub enum DomassistError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// User input rejected locally before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Action attempted without the required consent
    #[error("Consent required: {0}")]
    ConsentRequired(String),

    /// Consent state machine received a transition it cannot take
    #[error("Invalid consent transition: {0}")]
    ConsentTransition(String),

    /// Transport failure or unreadable webhook response
    #[error("Network error: {0}")]
    Network(String),

    /// Webhook answered with a non-2xx status
    #[error("Webhook returned HTTP {status}")]
    HttpStatus {
        /// The HTTP status code returned by the webhook
        status: u16,
    },

    /// Storage read/write failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Page gate (PIN) errors
    #[error("Gate error: {0}")]
    Gate(String),

    /// Audio capture errors
    #[error("Audio error: {0}")]
    Audio(String),

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
}

impl DomassistError {
    /// Returns true for failures that the widget reports with the fixed
    /// connection-error apology.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::HttpStatus { .. } | Self::Http(_)
        )
    }
}

/// Result type alias for DomAssist plumbing
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

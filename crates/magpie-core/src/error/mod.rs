//! Error types and result aliases for magpie operations.
//!
//! Provides a unified error type that covers all possible error conditions
//! across the magpie crates with actionable error messages.

use thiserror::Error;

/// Unified error type for all magpie operations
#[derive(Error, Debug)]
pub enum MagpieError {
    // Config errors
    #[error("Configuration input '{field}' is invalid: {reason}")]
    Config { field: String, reason: String },

    // Strict-mode lookup failure
    #[error("Cache not found for key: {key}")]
    CacheMiss { key: String },

    // Archive tool errors
    #[error("`{command}` failed (exit {code}): {stderr}")]
    Archive {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Refusing to extract archive entry '{entry}': {reason}")]
    Extract { entry: String, reason: String },

    // Save protocol errors
    #[error("Cache reservation failed: {message}")]
    Reserve { message: String },

    #[error("Chunk upload failed: {message}")]
    Upload { message: String },

    #[error("Cache commit failed: {message}")]
    Commit { message: String },

    // Transport errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for magpie operations
pub type MagpieResult<T> = Result<T, MagpieError>;

impl MagpieError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            MagpieError::Config { .. } => {
                Some("Check the action inputs; INPUT_TARGET_PATH must point at an existing project directory")
            },
            MagpieError::CacheMiss { .. } => {
                Some("Seed the cache with a full build, or disable fail-on-cache-miss")
            },
            MagpieError::Archive { .. } => {
                Some("Ensure tar and the configured compressor are installed in the runner image")
            },
            MagpieError::Network { .. } => Some("Check the cache service URL and runner network, then re-run"),
            _ => None,
        }
    }
}

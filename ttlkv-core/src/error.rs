//! Error types for ttlkv.
//!
//! The engine's read and write paths are infallible; everything here is
//! either input validation done by the transport layer or a setup failure.

use thiserror::Error;

/// Result type alias using `TtlkvError`.
pub type Result<T> = std::result::Result<T, TtlkvError>;

/// Main error type for all ttlkv operations.
#[derive(Debug, Error)]
pub enum TtlkvError {
    // ═══════════════════════════════════════════════════════════════════════════
    // REQUEST VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// A key was required but missing or empty.
    #[error("Key is required")]
    EmptyKey,

    /// Duration string could not be parsed.
    #[error("Invalid duration '{input}': {reason}")]
    InvalidDuration {
        /// The string as received
        input: String,
        /// What made it unparseable
        reason: String,
    },

    /// Duration parsed but is below zero.
    #[error("Duration must not be negative: '{0}'")]
    NegativeDuration(String),

    /// Duration does not fit in 64-bit nanoseconds.
    #[error("Duration out of range: '{0}'")]
    DurationOverflow(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // SETUP ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The cache needs a Tokio runtime to host its sweeper.
    #[error("No Tokio runtime available to run the background sweeper")]
    RuntimeUnavailable,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Socket I/O error, e.g. the listen address is taken.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl TtlkvError {
    /// Returns true if the error was caused by bad client input.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            TtlkvError::EmptyKey
                | TtlkvError::InvalidDuration { .. }
                | TtlkvError::NegativeDuration(_)
                | TtlkvError::DurationOverflow(_)
        )
    }
}

//! Error types for the Turnstile crate.

use thiserror::Error;

/// Main error type for counter operations.
#[derive(Error, Debug)]
pub enum TurnstileError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend errors, reserved for counter backends that can fail
    /// (e.g. a networked store reporting a timeout). The in-memory
    /// backend never produces this variant.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type alias for counter operations.
pub type Result<T> = std::result::Result<T, TurnstileError>;

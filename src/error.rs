//! Error types for manipulator-link
//!
//! This module defines the process-level error type used by the gateway.
//! We use `thiserror` for ergonomic error definitions and `anyhow` for
//! error propagation in application code. Device-level outcomes live in a
//! separate type (`facility::FacilityError`) because they are reported back
//! to the client inside a ResultTuple rather than propagated upward.

use thiserror::Error;

/// Main error type for gateway operations
#[derive(Error, Debug)]
pub enum LinkError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport errors (bind, accept, socket I/O)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias using LinkError
pub type Result<T> = std::result::Result<T, LinkError>;

impl From<serde_json::Error> for LinkError {
    fn from(err: serde_json::Error) -> Self {
        LinkError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for LinkError {
    fn from(err: toml::de::Error) -> Self {
        LinkError::Config(err.to_string())
    }
}

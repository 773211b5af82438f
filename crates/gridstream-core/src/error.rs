//! Error types for the GridStream workspace.

use thiserror::Error;

/// A shared error type for the GridStream service.
///
/// Variants are grouped by the failure taxonomy: configuration errors are
/// surfaced synchronously at session start (the session is never
/// registered), runtime kernel errors are converted to a
/// `simulation_error` message by the runner, and serialization errors
/// cover frames that cannot legally cross the wire.
#[derive(Error, Debug, Clone)]
pub enum GridStreamError {
    /// No simulator with this identifier exists in the catalog.
    #[error("Unknown simulator: '{0}'")]
    UnknownSimulator(String),

    /// A constructor parameter is missing, malformed, or out of bounds.
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    /// The requested configuration violates a kernel stability precondition.
    #[error("Unstable configuration: {0}")]
    Unstable(String),

    /// The kernel failed while stepping.
    #[error("Kernel error at step {step}: {message}")]
    Kernel { step: u64, message: String },

    /// The kernel produced a metric that cannot be serialized.
    #[error("Non-finite metric at step {0}")]
    NonFiniteMetric(u64),

    /// Serialization/deserialization error (wire payloads, catalog files).
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error (catalog file access).
    #[error("IO error: {0}")]
    Io(String),

    /// The session's channel has no live counterpart.
    #[error("Session channel closed")]
    ChannelClosed,

    /// Internal error (should not happen in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GridStreamError {
    /// Creates an InvalidParameter error.
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a Kernel error.
    pub fn kernel(step: u64, message: impl Into<String>) -> Self {
        Self::Kernel {
            step,
            message: message.into(),
        }
    }

    /// Creates an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// True for errors that must be reported synchronously at session
    /// start, before any session state exists.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::UnknownSimulator(_) | Self::InvalidParameter { .. } | Self::Unstable(_)
        )
    }
}

impl From<serde_json::Error> for GridStreamError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for GridStreamError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for GridStreamError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// A type alias for `Result<T, GridStreamError>`.
pub type Result<T> = std::result::Result<T, GridStreamError>;

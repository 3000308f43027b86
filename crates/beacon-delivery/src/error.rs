//! Error types for outbound delivery and pipeline lifecycle.
//!
//! Delivery errors never reach a client: by the time a record is delivered
//! the client has already been acknowledged. They are logged at the worker
//! boundary and the record is dropped. Categories exist for log fields.

use std::{fmt, time::Duration};

use thiserror::Error;

/// Result type alias for delivery operations.
pub type Result<T> = std::result::Result<T, DeliveryError>;

/// Error types for delivery and pipeline operations.
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    /// Request could not be established or the connection failed.
    #[error("network connection failed: {message}")]
    Transport {
        /// Error message describing the transport failure
        message: String,
    },

    /// HTTP request timeout exceeded.
    #[error("request timeout after {}ms", .timeout.as_millis())]
    Timeout {
        /// Configured timeout that elapsed
        timeout: Duration,
    },

    /// Outbound record could not be serialized.
    #[error("failed to encode outbound record: {message}")]
    Encoding {
        /// Serializer error message
        message: String,
    },

    /// Invalid pipeline or client configuration.
    #[error("invalid delivery configuration: {message}")]
    Configuration {
        /// Configuration error message
        message: String,
    },

    /// Worker did not stop within the shutdown timeout.
    #[error("worker shutdown timed out after {timeout:?}")]
    ShutdownTimeout {
        /// Timeout that was exceeded
        timeout: Duration,
    },

    /// Worker task panicked.
    #[error("delivery worker panicked: {error}")]
    WorkerPanic {
        /// Join error description
        error: String,
    },
}

impl DeliveryError {
    /// Creates a transport error from a message.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into() }
    }

    /// Creates a timeout error.
    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout { timeout }
    }

    /// Creates an encoding error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding { message: message.into() }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }
}

/// Category of delivery error for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connection, request, or timeout failures.
    Transport,
    /// Serialization failures.
    Encoding,
    /// Configuration problems.
    Configuration,
    /// Worker lifecycle problems.
    Internal,
}

impl From<&DeliveryError> for ErrorCategory {
    fn from(error: &DeliveryError) -> Self {
        match error {
            DeliveryError::Transport { .. } | DeliveryError::Timeout { .. } => Self::Transport,
            DeliveryError::Encoding { .. } => Self::Encoding,
            DeliveryError::Configuration { .. } => Self::Configuration,
            DeliveryError::ShutdownTimeout { .. } | DeliveryError::WorkerPanic { .. } => {
                Self::Internal
            },
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "transport"),
            Self::Encoding => write!(f, "encoding"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

//! Error types and result handling for intake and queueing.
//!
//! Defines the coded error taxonomy for everything a client can observe:
//! unreadable or unparsable request bodies, and a dispatch queue that cannot
//! accept more work. Delivery-side failures live in `beacon-delivery` since
//! they never reach a client.

use thiserror::Error;

/// Result type alias using `BeaconError`.
pub type Result<T> = std::result::Result<T, BeaconError>;

/// Beacon error types with stable codes.
#[derive(Debug, Error)]
pub enum BeaconError {
    // Intake Errors (E1001-E1002)
    /// Request body could not be read (E1001).
    #[error("[E1001] Malformed body: {reason}")]
    MalformedBody {
        /// Why the body could not be read
        reason: String,
    },

    /// Request body is not a valid intake record (E1002).
    #[error("[E1002] Malformed JSON: {reason}")]
    MalformedJson {
        /// Decoder diagnostic
        reason: String,
    },

    // Queue Errors (E3001-E3002)
    /// Dispatch queue has no free slot (E3001).
    #[error("[E3001] Queue full: dispatch queue at capacity {capacity}")]
    QueueFull {
        /// Configured capacity of the queue
        capacity: usize,
    },

    /// Dispatch queue no longer accepts records (E3002).
    #[error("[E3002] Queue closed: pipeline is shutting down")]
    QueueClosed,
}

impl BeaconError {
    /// Creates a malformed body error.
    pub fn malformed_body(reason: impl Into<String>) -> Self {
        Self::MalformedBody { reason: reason.into() }
    }

    /// Creates a malformed JSON error.
    pub fn malformed_json(reason: impl Into<String>) -> Self {
        Self::MalformedJson { reason: reason.into() }
    }

    /// Returns the error code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MalformedBody { .. } => "E1001",
            Self::MalformedJson { .. } => "E1002",
            Self::QueueFull { .. } => "E3001",
            Self::QueueClosed => "E3002",
        }
    }
}

impl From<serde_json::Error> for BeaconError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed_json(err.to_string())
    }
}

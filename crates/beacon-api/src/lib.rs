//! Beacon HTTP API.
//!
//! Accepts tracking events on `POST /submit`, acknowledges them at once, and
//! hands them to the delivery pipeline.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod handlers;
pub mod server;

use beacon_delivery::{PipelineHandle, QueueFullPolicy};

pub use config::Config;
pub use server::{create_router, start_server};

/// Shared state handed to every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Handle to the running delivery pipeline.
    pub pipeline: PipelineHandle,
    /// What intake does when the dispatch queue is full.
    pub queue_full_policy: QueueFullPolicy,
}

impl AppState {
    /// Creates handler state around a pipeline handle.
    pub fn new(pipeline: PipelineHandle, queue_full_policy: QueueFullPolicy) -> Self {
        Self { pipeline, queue_full_policy }
    }
}

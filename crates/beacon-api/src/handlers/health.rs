//! Health check handlers for service monitoring.
//!
//! `/health` reports queue depth and worker state; `/live` only shows the
//! process is answering.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use beacon_delivery::{WorkerState, WorkerStats};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::AppState;

/// Health check response structure.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service health status
    pub status: HealthStatus,
    /// Timestamp when health check was performed
    pub timestamp: DateTime<Utc>,
    /// Individual component health checks
    pub checks: HealthChecks,
    /// Service version information
    pub version: String,
}

/// Overall health status enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Worker running with free queue slots
    Healthy,
    /// Worker running but the queue is full
    Degraded,
    /// Worker has stopped; records will not be delivered
    Unhealthy,
}

/// Individual component health check results.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// Dispatch queue occupancy
    pub queue: QueueHealth,
    /// Delivery worker state and counters
    pub worker: WorkerStats,
}

/// Dispatch queue occupancy.
#[derive(Debug, Serialize)]
pub struct QueueHealth {
    /// Records waiting for delivery
    pub depth: usize,
    /// Maximum records the queue holds
    pub capacity: usize,
}

fn overall_status(queue: &QueueHealth, worker: &WorkerStats) -> HealthStatus {
    if worker.state == WorkerState::Stopped {
        HealthStatus::Unhealthy
    } else if queue.depth >= queue.capacity {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

/// Health check endpoint handler.
#[instrument(name = "health_check", skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Response {
    let queue = QueueHealth {
        depth: state.pipeline.queue_depth(),
        capacity: state.pipeline.queue_capacity(),
    };
    let worker = state.pipeline.stats().await;

    let response = HealthResponse {
        status: overall_status(&queue, &worker),
        timestamp: Utc::now(),
        checks: HealthChecks { queue, worker },
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let status_code = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    debug!(
        status = ?response.status,
        queue_depth = response.checks.queue.depth,
        worker_state = ?response.checks.worker.state,
        "Health check completed"
    );

    (status_code, Json(response)).into_response()
}

/// Liveness check endpoint.
///
/// Does not look at the pipeline.
#[instrument(name = "liveness_check")]
pub async fn liveness_check() -> Response {
    let response = serde_json::json!({
        "status": "alive",
        "timestamp": Utc::now(),
        "service": "beacon"
    });

    (StatusCode::OK, Json(response)).into_response()
}

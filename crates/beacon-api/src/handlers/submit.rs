//! Event intake handler.
//!
//! Decodes the body into an intake record, hands it to the dispatch queue,
//! and acknowledges without waiting for delivery.

use axum::{
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use beacon_core::{BeaconError, IntakeRecord};
use bytes::Bytes;
use tracing::{debug, instrument, warn};

use crate::AppState;

/// Body of the acknowledgement returned for every accepted record.
pub const ACKNOWLEDGEMENT: &str = "Request received and processing started";

/// Accepts a tracking event for asynchronous delivery.
///
/// The acknowledgement carries no delivery guarantee: the record may still
/// be dropped if the destination cannot be reached.
///
/// # Errors
///
/// Answers in plain text with:
/// - 400 `Error reading request body` if the body cannot be read or exceeds
///   the size limit
/// - 400 `Error decoding JSON` if the body is not an intake record
/// - 503 `Queue full` if the queue is full and the reject policy is active
/// - 503 `Queue closed` if the relay is shutting down
#[instrument(
    name = "submit_event",
    skip(state, body),
    fields(body_bytes = tracing::field::Empty)
)]
pub async fn submit_event(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            let error = BeaconError::malformed_body(rejection.body_text());
            warn!(error = %error, "failed to read request body");
            return error_response(&error);
        },
    };
    tracing::Span::current().record("body_bytes", body.len());

    let record = match IntakeRecord::decode(&body) {
        Ok(record) => record,
        Err(error) => {
            warn!(error = %error, "rejecting malformed intake record");
            return error_response(&error);
        },
    };

    let event = record.event.clone();
    if let Err(error) = state.pipeline.submit(record, state.queue_full_policy) {
        warn!(error = %error, code = error.code(), "failed to enqueue record");
        return error_response(&error);
    }

    debug!(event = %event, queue_depth = state.pipeline.queue_depth(), "record accepted");
    (StatusCode::OK, ACKNOWLEDGEMENT).into_response()
}

fn error_response(error: &BeaconError) -> Response {
    let (status, message) = match error {
        BeaconError::MalformedBody { .. } => {
            (StatusCode::BAD_REQUEST, "Error reading request body")
        },
        BeaconError::MalformedJson { .. } => (StatusCode::BAD_REQUEST, "Error decoding JSON"),
        BeaconError::QueueFull { .. } => (StatusCode::SERVICE_UNAVAILABLE, "Queue full"),
        BeaconError::QueueClosed => (StatusCode::SERVICE_UNAVAILABLE, "Queue closed"),
    };

    (status, message).into_response()
}

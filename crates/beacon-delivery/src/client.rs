//! HTTP client for forwarding outbound records.
//!
//! One call, one POST. The response status is recorded for logging but never
//! decides success: a delivery succeeds when the request completed without a
//! transport error.

use std::time::{Duration, Instant};

use beacon_core::OutboundRecord;
use serde::{Deserialize, Serialize};
use tracing::{info_span, Instrument};

use crate::error::{DeliveryError, Result};

/// Configuration for the delivery client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Total request timeout. `None` waits for as long as the transport
    /// allows.
    pub timeout: Option<Duration>,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { timeout: None, user_agent: "Beacon/1.0".to_string() }
    }
}

/// Outcome of a completed delivery call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// HTTP status code returned by the destination.
    pub status_code: u16,
    /// Total duration of the request.
    pub duration: Duration,
}

/// HTTP client that posts outbound records as JSON.
#[derive(Debug, Clone)]
pub struct DeliveryClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl DeliveryClient {
    /// Creates a new delivery client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Configuration` if the HTTP client cannot be
    /// built with the provided settings.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(&config.user_agent);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| {
            DeliveryError::configuration(format!("failed to build HTTP client: {e}"))
        })?;

        Ok(Self { client, config })
    }

    /// Creates a new delivery client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Configuration` if the HTTP client cannot be
    /// built.
    pub fn with_defaults() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Posts an outbound record to `url`.
    ///
    /// Issues exactly one request. Any response, whatever its status, counts
    /// as delivered.
    ///
    /// # Errors
    ///
    /// - `Encoding` if the record cannot be serialized
    /// - `Timeout` if the configured timeout elapses
    /// - `Transport` for connection failures and requests that could not be
    ///   built or sent
    pub async fn deliver(&self, record: OutboundRecord, url: &str) -> Result<DeliveryReceipt> {
        let span = info_span!(
            "outbound_delivery",
            url = %url,
            event = %record.event,
            message_id = %record.message_id,
        );

        async move {
            let body = serde_json::to_vec(&record)
                .map_err(|e| DeliveryError::encoding(e.to_string()))?;

            tracing::debug!(body_bytes = body.len(), "sending outbound record");

            let start_time = Instant::now();
            let response = self
                .client
                .post(url)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await
                .map_err(|e| {
                    tracing::warn!(
                        duration_ms = start_time.elapsed().as_millis(),
                        "request failed: {}",
                        e
                    );
                    self.classify(&e)
                })?;

            let receipt = DeliveryReceipt {
                status_code: response.status().as_u16(),
                duration: start_time.elapsed(),
            };

            tracing::debug!(
                status = receipt.status_code,
                duration_ms = receipt.duration.as_millis(),
                "received response"
            );

            Ok(receipt)
        }
        .instrument(span)
        .await
    }

    fn classify(&self, error: &reqwest::Error) -> DeliveryError {
        if error.is_timeout() {
            return DeliveryError::timeout(self.config.timeout.unwrap_or_default());
        }
        if error.is_connect() {
            return DeliveryError::transport(format!("connection failed: {error}"));
        }
        DeliveryError::transport(error.to_string())
    }
}

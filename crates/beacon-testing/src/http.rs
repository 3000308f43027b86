//! Mock downstream webhook for delivery tests.

use std::time::{Duration, Instant};

use beacon_core::OutboundRecord;
use wiremock::{
    matchers::{body_partial_json, method},
    Mock, MockServer, ResponseTemplate,
};

/// Downstream webhook that accepts outbound records and remembers them.
pub struct MockDownstream {
    server: MockServer,
}

impl MockDownstream {
    /// Starts a mock downstream on a random port that answers every POST
    /// with `200 OK`.
    pub async fn start() -> Self {
        let downstream = Self::start_empty().await;
        downstream.respond_with_status(200).await;
        downstream
    }

    /// Starts a mock downstream with no responses mounted.
    pub async fn start_empty() -> Self {
        Self { server: MockServer::start().await }
    }

    /// Destination URL to configure the relay with.
    pub fn url(&self) -> String {
        format!("{}/hook", self.server.uri())
    }

    /// Answers every POST with `status`.
    pub async fn respond_with_status(&self, status: u16) {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Answers every POST with `status` after `delay`.
    pub async fn respond_with_delay(&self, status: u16, delay: Duration) {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status).set_delay(delay))
            .mount(&self.server)
            .await;
    }

    /// Delays the response to records whose `event` equals `event`. Takes
    /// precedence over the catch-all responses.
    pub async fn delay_event(&self, event: &str, delay: Duration) {
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({ "event": event })))
            .respond_with(ResponseTemplate::new(200).set_delay(delay))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Outbound records received so far, in arrival order.
    pub async fn received_records(&self) -> Vec<OutboundRecord> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| {
                serde_json::from_slice(&request.body)
                    .expect("downstream body is an outbound record")
            })
            .collect()
    }

    /// Waits until at least `count` records have arrived or `timeout`
    /// elapses, then returns what was received.
    pub async fn wait_for_records(&self, count: usize, timeout: Duration) -> Vec<OutboundRecord> {
        let deadline = Instant::now() + timeout;
        loop {
            let records = self.received_records().await;
            if records.len() >= count || Instant::now() >= deadline {
                return records;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// `Content-Type` of every request received, in arrival order.
    pub async fn received_content_types(&self) -> Vec<Option<String>> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| {
                request
                    .headers
                    .get("content-type")
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string)
            })
            .collect()
    }
}

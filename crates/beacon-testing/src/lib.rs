//! Test infrastructure for the beacon relay.
//!
//! Provides a mock downstream webhook that records what the delivery worker
//! sends, and builders for intake records in their compact wire form.

#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::expect_used)]

use std::{net::TcpListener, time::Duration};

pub mod fixtures;
pub mod http;

pub use fixtures::IntakeBuilder;
pub use http::MockDownstream;

/// Default time to wait for asynchronous deliveries in tests.
pub const DELIVERY_WAIT: Duration = Duration::from_secs(5);

/// Returns an http URL on a local port that nothing is listening on.
///
/// The port is bound and released immediately, so connection attempts are
/// refused rather than hanging.
pub fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("ephemeral port address").port();
    drop(listener);
    format!("http://127.0.0.1:{port}/")
}

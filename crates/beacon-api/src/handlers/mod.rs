//! HTTP request handlers for the Beacon API.
//!
//! - `submit` - event intake
//! - `health` - health and liveness probes
//!
//! Intake answers in plain text so existing tracking snippets keep working;
//! the probes answer in JSON.

pub mod health;
pub mod submit;

pub use health::{health_check, liveness_check};
pub use submit::submit_event;

//! Core tracking-event model, transform, and error taxonomy.
//!
//! Provides the intake and outbound record shapes, the pure field-remapping
//! transform between them, and the coded error taxonomy shared by the
//! delivery pipeline and the HTTP layer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod models;
pub mod transform;

pub use error::{BeaconError, Result};
pub use models::{AttributeEntry, IntakeRecord, OutboundRecord, TraitEntry};
pub use transform::transform;

//! Dispatch queue and delivery worker for tracking events.
//!
//! Intake hands records to a bounded FIFO queue and returns immediately. A
//! single worker drains the queue, reshapes each record into the outbound
//! schema, and posts it to the configured destination.
//!
//! # Architecture
//!
//! 1. **Dispatch** - Handlers push records through a [`PipelineHandle`]
//! 2. **Transform** - The worker remaps each record with
//!    [`beacon_core::transform`]
//! 3. **Deliver** - One POST per record, no retries
//! 4. **Log** - Outcome is logged; failures drop the record
//!
//! # Example
//!
//! ```no_run
//! use beacon_core::IntakeRecord;
//! use beacon_delivery::{DeliveryError, Pipeline, PipelineConfig, QueueFullPolicy};
//!
//! # async fn example() -> std::result::Result<(), DeliveryError> {
//! let pipeline = Pipeline::start(PipelineConfig::default())?;
//! let handle = pipeline.handle();
//!
//! let _ = handle.submit(IntakeRecord::default(), QueueFullPolicy::Block);
//!
//! pipeline.shutdown().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod pipeline;
pub mod queue;
pub mod worker;

pub use client::{ClientConfig, DeliveryClient, DeliveryReceipt};
pub use error::{DeliveryError, ErrorCategory, Result};
pub use pipeline::{Pipeline, PipelineConfig, PipelineHandle};
pub use queue::{dispatch_queue, DispatchReceiver, DispatchSender, QueueFullPolicy};
pub use worker::{DeliveryWorker, WorkerState, WorkerStats};

/// Default number of records the dispatch queue holds.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Default destination for outbound records.
pub const DEFAULT_DESTINATION_URL: &str = "https://webhook.site/";

/// Default time allowed for the worker to drain on shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECONDS: u64 = 30;

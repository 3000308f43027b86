//! Pipeline wiring: one dispatch queue, one worker, one client.
//!
//! `Pipeline` owns the worker task. `PipelineHandle` is the cheap, cloneable
//! view that request handlers use to enqueue records and read stats.

use std::{sync::Arc, time::Duration};

use beacon_core::IntakeRecord;
use serde::{Deserialize, Serialize};
use tokio::{sync::RwLock, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    client::{ClientConfig, DeliveryClient},
    error::{DeliveryError, Result},
    queue::{dispatch_queue, DispatchSender, QueueFullPolicy},
    worker::{DeliveryWorker, WorkerState, WorkerStats},
};

/// Configuration for the delivery pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum number of records waiting for delivery.
    pub queue_capacity: usize,

    /// URL every outbound record is posted to.
    pub destination_url: String,

    /// HTTP client configuration.
    pub client_config: ClientConfig,

    /// Maximum time to wait for the worker to drain on shutdown.
    pub shutdown_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: crate::DEFAULT_QUEUE_CAPACITY,
            destination_url: crate::DEFAULT_DESTINATION_URL.to_string(),
            client_config: ClientConfig::default(),
            shutdown_timeout: Duration::from_secs(crate::DEFAULT_SHUTDOWN_TIMEOUT_SECONDS),
        }
    }
}

/// Running delivery pipeline.
pub struct Pipeline {
    handle: PipelineHandle,
    cancellation_token: CancellationToken,
    worker_handle: Option<JoinHandle<Result<()>>>,
    shutdown_timeout: Duration,
}

impl Pipeline {
    /// Creates the queue and client, then spawns the delivery worker.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Configuration` if the queue capacity is zero or
    /// the HTTP client cannot be built.
    pub fn start(config: PipelineConfig) -> Result<Self> {
        let (sender, receiver) = dispatch_queue(config.queue_capacity)?;
        let client = Arc::new(DeliveryClient::new(config.client_config)?);
        let stats = Arc::new(RwLock::new(WorkerStats::default()));
        let cancellation_token = CancellationToken::new();

        info!(
            queue_capacity = config.queue_capacity,
            destination = %config.destination_url,
            "starting delivery pipeline"
        );

        let worker = DeliveryWorker::new(
            receiver,
            client,
            config.destination_url,
            stats.clone(),
            cancellation_token.clone(),
        );

        let worker_handle = tokio::spawn(async move {
            let result = worker.run().await;
            if let Err(ref error) = result {
                error!(error = %error, "delivery worker terminated with error");
            }
            result
        });

        Ok(Self {
            handle: PipelineHandle::new(sender, stats),
            cancellation_token,
            worker_handle: Some(worker_handle),
            shutdown_timeout: config.shutdown_timeout,
        })
    }

    /// Returns a handle for enqueueing records.
    pub fn handle(&self) -> PipelineHandle {
        self.handle.clone()
    }

    /// Stops intake and waits for the worker to deliver what is queued.
    ///
    /// Enqueues deferred by a full queue land first, then the queue closes
    /// and the worker drains it. The whole sequence shares one timeout.
    ///
    /// # Errors
    ///
    /// Returns `ShutdownTimeout` if the worker does not finish within the
    /// configured timeout, or `WorkerPanic` if the worker task panicked.
    pub async fn shutdown(mut self) -> Result<()> {
        let timeout = self.shutdown_timeout;
        let sender = self.handle.sender.clone();
        info!(
            queued = sender.depth(),
            deferred = sender.deferred_count(),
            timeout_seconds = timeout.as_secs(),
            "shutting down delivery pipeline"
        );

        let Some(worker_handle) = self.worker_handle.take() else {
            self.cancellation_token.cancel();
            return Ok(());
        };

        let cancellation_token = self.cancellation_token.clone();
        let drain = async move {
            sender.flush_deferred().await;
            cancellation_token.cancel();
            worker_handle.await
        };

        match tokio::time::timeout(timeout, drain).await {
            Ok(Ok(result)) => {
                info!("delivery pipeline shutdown completed");
                result
            },
            Ok(Err(join_error)) => {
                error!(error = %join_error, "delivery worker panicked during shutdown");
                Err(DeliveryError::WorkerPanic { error: join_error.to_string() })
            },
            Err(_elapsed) => {
                self.cancellation_token.cancel();
                error!(
                    timeout_seconds = timeout.as_secs(),
                    "delivery worker did not drain before the shutdown timeout"
                );
                Err(DeliveryError::ShutdownTimeout { timeout })
            },
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        let running = self.worker_handle.as_ref().is_some_and(|h| !h.is_finished());
        if running && !self.cancellation_token.is_cancelled() {
            warn!("Pipeline dropped without shutdown, cancelling delivery worker");
            self.cancellation_token.cancel();
        }
    }
}

/// Cloneable handle to a running pipeline.
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    sender: DispatchSender,
    stats: Arc<RwLock<WorkerStats>>,
}

impl PipelineHandle {
    /// Builds a handle from its parts. Useful for driving intake against a
    /// queue without a worker attached.
    pub fn new(sender: DispatchSender, stats: Arc<RwLock<WorkerStats>>) -> Self {
        Self { sender, stats }
    }

    /// Hands a record to the queue under `policy`. See
    /// [`DispatchSender::dispatch`].
    ///
    /// # Errors
    ///
    /// Returns `QueueClosed` or, under `Reject`, `QueueFull`.
    pub fn submit(
        &self,
        record: IntakeRecord,
        policy: QueueFullPolicy,
    ) -> beacon_core::Result<()> {
        self.sender.dispatch(record, policy)
    }

    /// Records currently waiting for delivery.
    pub fn queue_depth(&self) -> usize {
        self.sender.depth()
    }

    /// Maximum number of records the queue holds.
    pub fn queue_capacity(&self) -> usize {
        self.sender.capacity()
    }

    /// Returns current worker statistics.
    pub async fn stats(&self) -> WorkerStats {
        self.stats.read().await.clone()
    }

    /// Whether the worker loop is still running or draining.
    pub async fn is_worker_alive(&self) -> bool {
        self.stats.read().await.state != WorkerState::Stopped
    }
}

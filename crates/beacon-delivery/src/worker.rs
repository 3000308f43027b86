//! Single delivery worker draining the dispatch queue.
//!
//! The worker takes records in FIFO order and handles one at a time:
//! transform, deliver, log. A failed delivery is logged and the record is
//! dropped; the loop always moves on to the next record.

use std::sync::Arc;

use beacon_core::{transform, IntakeRecord};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{
    client::DeliveryClient,
    error::{ErrorCategory, Result},
    queue::DispatchReceiver,
};

/// Lifecycle state of the delivery worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Taking records from the queue as they arrive.
    #[default]
    Draining,
    /// Queue closed to new records; finishing what is already buffered.
    Closing,
    /// Loop has exited.
    Stopped,
}

/// Counters for worker monitoring.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkerStats {
    /// Records taken from the queue since startup.
    pub records_processed: u64,
    /// Deliveries that completed without a transport error.
    pub successful_deliveries: u64,
    /// Deliveries that failed and were dropped.
    pub failed_deliveries: u64,
    /// Current lifecycle state.
    pub state: WorkerState,
}

enum Next {
    Record(IntakeRecord),
    Shutdown,
    Closed,
}

/// Consumer that forwards queued records to the destination.
pub struct DeliveryWorker {
    receiver: DispatchReceiver,
    client: Arc<DeliveryClient>,
    destination: String,
    stats: Arc<RwLock<WorkerStats>>,
    cancellation_token: CancellationToken,
}

impl DeliveryWorker {
    /// Creates a worker bound to the receiving half of the queue.
    pub fn new(
        receiver: DispatchReceiver,
        client: Arc<DeliveryClient>,
        destination: String,
        stats: Arc<RwLock<WorkerStats>>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self { receiver, client, destination, stats, cancellation_token }
    }

    /// Main worker loop. Runs until cancelled and drained, or until every
    /// sender is dropped.
    ///
    /// On cancellation the queue is closed to new records and whatever is
    /// already buffered is still delivered.
    ///
    /// # Errors
    ///
    /// Delivery failures never end the loop; the signature leaves room for
    /// setup failures.
    pub async fn run(mut self) -> Result<()> {
        info!(destination = %self.destination, "delivery worker starting");

        let mut closing = false;
        loop {
            let next = tokio::select! {
                biased;
                () = self.cancellation_token.cancelled(), if !closing => {
                    Next::Shutdown
                }
                record = self.receiver.dequeue() => match record {
                    Some(record) => Next::Record(record),
                    None => Next::Closed,
                },
            };

            match next {
                Next::Record(record) => self.process_record(record).await,
                Next::Shutdown => {
                    info!("delivery worker received shutdown signal, draining queue");
                    self.receiver.close();
                    closing = true;
                    self.stats.write().await.state = WorkerState::Closing;
                },
                Next::Closed => break,
            }
        }

        self.stats.write().await.state = WorkerState::Stopped;
        info!("delivery worker stopped");
        Ok(())
    }

    async fn process_record(&self, record: IntakeRecord) {
        let outbound = transform(record);
        debug!(event = %outbound.event, message_id = %outbound.message_id, "forwarding record");

        let result = self.client.deliver(outbound, &self.destination).await;

        let mut stats = self.stats.write().await;
        stats.records_processed += 1;

        match result {
            Ok(receipt) => {
                stats.successful_deliveries += 1;
                info!(
                    status_code = receipt.status_code,
                    duration_ms = receipt.duration.as_millis(),
                    "record delivered"
                );
            },
            Err(error) => {
                stats.failed_deliveries += 1;
                error!(
                    error = %error,
                    category = %ErrorCategory::from(&error),
                    "record delivery failed, dropping"
                );
            },
        }
    }
}

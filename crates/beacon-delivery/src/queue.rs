//! Bounded FIFO dispatch queue between intake and the delivery worker.
//!
//! Built on a tokio `mpsc` channel. The sending half is cloned into every
//! request handler; the receiving half belongs to the single delivery worker.
//! Enqueues deferred by a full queue run on a shared `TaskTracker` so shutdown
//! can wait for them before closing the queue.

use beacon_core::{BeaconError, IntakeRecord};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::error::{DeliveryError, Result};

/// What intake does when the dispatch queue has no free slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueFullPolicy {
    /// Acknowledge the client and hand the record to a background task that
    /// waits for a free slot.
    #[default]
    Block,
    /// Refuse the record so the client sees the backpressure.
    Reject,
}

/// Creates a dispatch queue holding at most `capacity` records.
///
/// # Errors
///
/// Returns `DeliveryError::Configuration` if `capacity` is zero.
pub fn dispatch_queue(capacity: usize) -> Result<(DispatchSender, DispatchReceiver)> {
    if capacity == 0 {
        return Err(DeliveryError::configuration("queue capacity must be greater than 0"));
    }

    let (tx, rx) = mpsc::channel(capacity);
    Ok((DispatchSender { tx, deferred: TaskTracker::new() }, DispatchReceiver { rx }))
}

/// Producer half of the dispatch queue.
#[derive(Debug, Clone)]
pub struct DispatchSender {
    tx: mpsc::Sender<IntakeRecord>,
    deferred: TaskTracker,
}

impl DispatchSender {
    /// Appends a record, waiting for a free slot if the queue is full.
    ///
    /// # Errors
    ///
    /// Returns `BeaconError::QueueClosed` if the consumer has gone away.
    pub async fn enqueue(&self, record: IntakeRecord) -> beacon_core::Result<()> {
        self.tx.send(record).await.map_err(|_| BeaconError::QueueClosed)
    }

    /// Appends a record only if a slot is free right now.
    ///
    /// # Errors
    ///
    /// Returns `BeaconError::QueueFull` when every slot is taken and
    /// `BeaconError::QueueClosed` if the consumer has gone away.
    pub fn try_enqueue(&self, record: IntakeRecord) -> beacon_core::Result<()> {
        self.tx.try_send(record).map_err(|e| match e {
            TrySendError::Full(_) => BeaconError::QueueFull { capacity: self.capacity() },
            TrySendError::Closed(_) => BeaconError::QueueClosed,
        })
    }

    /// Hands a record to the queue under the given full-queue policy.
    ///
    /// Never waits. Under `Block`, a record that finds the queue full is
    /// moved to a tracked task that completes the enqueue once a slot frees
    /// up. Records that fit immediately keep their arrival order.
    ///
    /// # Errors
    ///
    /// Returns `BeaconError::QueueClosed` if the queue is closed, and
    /// `BeaconError::QueueFull` when full under `Reject`.
    pub fn dispatch(
        &self,
        record: IntakeRecord,
        policy: QueueFullPolicy,
    ) -> beacon_core::Result<()> {
        match policy {
            QueueFullPolicy::Reject => self.try_enqueue(record),
            QueueFullPolicy::Block => match self.tx.try_reserve() {
                Ok(permit) => {
                    permit.send(record);
                    Ok(())
                },
                Err(TrySendError::Closed(())) => Err(BeaconError::QueueClosed),
                Err(TrySendError::Full(())) => {
                    debug!(capacity = self.capacity(), "dispatch queue full, deferring enqueue");
                    let sender = self.clone();
                    self.deferred.spawn(async move {
                        if sender.enqueue(record).await.is_err() {
                            warn!("dispatch queue closed before deferred record was enqueued");
                        }
                    });
                    Ok(())
                },
            },
        }
    }

    /// Waits until every deferred enqueue has landed in the queue or failed.
    ///
    /// Records dispatched after this returns are still tracked; callers stop
    /// intake first.
    pub async fn flush_deferred(&self) {
        self.deferred.close();
        self.deferred.wait().await;
    }

    /// Number of deferred enqueues still waiting for a slot.
    pub fn deferred_count(&self) -> usize {
        self.deferred.len()
    }

    /// Number of records currently waiting in the queue.
    pub fn depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Maximum number of records the queue holds.
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

}

/// Consumer half of the dispatch queue.
#[derive(Debug)]
pub struct DispatchReceiver {
    rx: mpsc::Receiver<IntakeRecord>,
}

impl DispatchReceiver {
    /// Removes the oldest record, waiting while the queue is empty.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub async fn dequeue(&mut self) -> Option<IntakeRecord> {
        self.rx.recv().await
    }

    /// Stops accepting new records. Records already queued can still be
    /// dequeued.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn record(event: &str) -> IntakeRecord {
        IntakeRecord { event: event.to_string(), ..Default::default() }
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(matches!(dispatch_queue(0), Err(DeliveryError::Configuration { .. })));
    }

    #[tokio::test]
    async fn records_dequeued_in_fifo_order() {
        let (tx, mut rx) = dispatch_queue(10).unwrap();

        for event in ["a", "b", "c"] {
            tx.enqueue(record(event)).await.unwrap();
        }

        assert_eq!(rx.dequeue().await.unwrap().event, "a");
        assert_eq!(rx.dequeue().await.unwrap().event, "b");
        assert_eq!(rx.dequeue().await.unwrap().event, "c");
    }

    #[tokio::test]
    async fn depth_tracks_queued_records() {
        let (tx, mut rx) = dispatch_queue(10).unwrap();
        assert_eq!(tx.depth(), 0);
        assert_eq!(tx.capacity(), 10);

        tx.enqueue(record("a")).await.unwrap();
        tx.enqueue(record("b")).await.unwrap();
        assert_eq!(tx.depth(), 2);

        rx.dequeue().await.unwrap();
        assert_eq!(tx.depth(), 1);
    }

    #[tokio::test]
    async fn try_enqueue_reports_full_queue() {
        let (tx, _rx) = dispatch_queue(2).unwrap();

        tx.try_enqueue(record("a")).unwrap();
        tx.try_enqueue(record("b")).unwrap();

        let error = tx.try_enqueue(record("c")).unwrap_err();
        assert!(matches!(error, BeaconError::QueueFull { capacity: 2 }));
    }

    #[tokio::test]
    async fn enqueue_blocks_until_slot_frees() {
        let (tx, mut rx) = dispatch_queue(10).unwrap();
        for i in 0..10 {
            tx.enqueue(record(&i.to_string())).await.unwrap();
        }

        let blocked = tokio::spawn({
            let tx = tx.clone();
            async move { tx.enqueue(record("10")).await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!blocked.is_finished());

        assert_eq!(rx.dequeue().await.unwrap().event, "0");
        tokio::time::timeout(Duration::from_secs(1), blocked).await.unwrap().unwrap().unwrap();
        assert_eq!(tx.depth(), 10);
    }

    #[tokio::test]
    async fn dispatch_block_policy_defers_when_full() {
        let (tx, mut rx) = dispatch_queue(1).unwrap();

        tx.dispatch(record("first"), QueueFullPolicy::Block).unwrap();
        tx.dispatch(record("second"), QueueFullPolicy::Block).unwrap();
        assert_eq!(tx.depth(), 1);

        assert_eq!(rx.dequeue().await.unwrap().event, "first");
        let deferred = tokio::time::timeout(Duration::from_secs(1), rx.dequeue()).await.unwrap();
        assert_eq!(deferred.unwrap().event, "second");
    }

    #[tokio::test]
    async fn flush_deferred_waits_for_pending_enqueues() {
        let (tx, mut rx) = dispatch_queue(1).unwrap();

        tx.dispatch(record("first"), QueueFullPolicy::Block).unwrap();
        tx.dispatch(record("second"), QueueFullPolicy::Block).unwrap();
        tx.dispatch(record("third"), QueueFullPolicy::Block).unwrap();
        assert_eq!(tx.deferred_count(), 2);

        let consumer = tokio::spawn(async move {
            let mut events = Vec::new();
            while events.len() < 3 {
                events.push(rx.dequeue().await.unwrap().event);
            }
            events
        });

        tokio::time::timeout(Duration::from_secs(1), tx.flush_deferred()).await.unwrap();
        assert_eq!(tx.deferred_count(), 0);

        let mut events = consumer.await.unwrap();
        events.sort();
        assert_eq!(events, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn dispatch_reject_policy_refuses_when_full() {
        let (tx, _rx) = dispatch_queue(1).unwrap();

        tx.dispatch(record("first"), QueueFullPolicy::Reject).unwrap();
        let error = tx.dispatch(record("second"), QueueFullPolicy::Reject).unwrap_err();

        assert!(matches!(error, BeaconError::QueueFull { capacity: 1 }));
    }

    #[tokio::test]
    async fn closed_queue_refuses_new_records_but_drains() {
        let (tx, mut rx) = dispatch_queue(10).unwrap();
        tx.enqueue(record("queued")).await.unwrap();

        rx.close();

        assert!(matches!(tx.enqueue(record("late")).await, Err(BeaconError::QueueClosed)));
        assert!(matches!(
            tx.dispatch(record("late"), QueueFullPolicy::Block),
            Err(BeaconError::QueueClosed)
        ));
        assert_eq!(rx.dequeue().await.unwrap().event, "queued");
        assert!(rx.dequeue().await.is_none());
    }

    #[test]
    fn policy_deserializes_lowercase() {
        let policy: QueueFullPolicy = serde_json::from_str("\"reject\"").unwrap();
        assert_eq!(policy, QueueFullPolicy::Reject);
        assert_eq!(QueueFullPolicy::default(), QueueFullPolicy::Block);
    }
}

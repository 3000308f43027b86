//! Integration tests for the delivery worker and pipeline lifecycle.
//!
//! Tests FIFO delivery order, failure isolation between records, and
//! draining of queued and deferred records on shutdown.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use beacon_delivery::{ClientConfig, Pipeline, PipelineConfig, QueueFullPolicy, WorkerState};
use beacon_testing::{unreachable_url, IntakeBuilder, MockDownstream, DELIVERY_WAIT};

fn pipeline_config(destination_url: String) -> PipelineConfig {
    PipelineConfig {
        destination_url,
        shutdown_timeout: Duration::from_secs(10),
        ..Default::default()
    }
}

#[tokio::test]
async fn records_delivered_in_submission_order() {
    let downstream = MockDownstream::start().await;
    let pipeline = Pipeline::start(pipeline_config(downstream.url())).unwrap();
    let handle = pipeline.handle();

    for i in 0..5 {
        let record = IntakeBuilder::new().event(format!("event-{i}")).build();
        handle.submit(record, QueueFullPolicy::Block).unwrap();
    }

    let received = downstream.wait_for_records(5, DELIVERY_WAIT).await;
    let events: Vec<_> = received.iter().map(|r| r.event.as_str()).collect();
    assert_eq!(events, ["event-0", "event-1", "event-2", "event-3", "event-4"]);

    pipeline.shutdown().await.unwrap();
}

#[tokio::test]
async fn delivered_record_is_transformed() {
    let downstream = MockDownstream::start().await;
    let pipeline = Pipeline::start(pipeline_config(downstream.url())).unwrap();

    let record = IntakeBuilder::with_defaults()
        .event("click")
        .attribute("color", "red", "string")
        .user_trait("plan", "pro", "string")
        .build();
    pipeline.handle().submit(record, QueueFullPolicy::Block).unwrap();

    let received = downstream.wait_for_records(1, DELIVERY_WAIT).await;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].event, "click");
    assert_eq!(received[0].user_id, "user-1");
    assert_eq!(received[0].attributes["color"].value, "red");
    assert_eq!(received[0].traits["plan"].value_type, "string");

    pipeline.shutdown().await.unwrap();
}

#[tokio::test]
async fn failed_delivery_does_not_stop_later_records() {
    let downstream = MockDownstream::start().await;
    downstream.delay_event("slow", Duration::from_secs(5)).await;

    let config = PipelineConfig {
        client_config: ClientConfig {
            timeout: Some(Duration::from_millis(200)),
            ..Default::default()
        },
        ..pipeline_config(downstream.url())
    };
    let pipeline = Pipeline::start(config).unwrap();
    let handle = pipeline.handle();

    handle.submit(IntakeBuilder::new().event("slow").build(), QueueFullPolicy::Block).unwrap();
    handle.submit(IntakeBuilder::new().event("fast").build(), QueueFullPolicy::Block).unwrap();

    let received = downstream.wait_for_records(2, DELIVERY_WAIT).await;
    let events: Vec<_> = received.iter().map(|r| r.event.as_str()).collect();
    assert_eq!(events, ["slow", "fast"]);

    pipeline.shutdown().await.unwrap();

    let stats = handle.stats().await;
    assert_eq!(stats.records_processed, 2);
    assert_eq!(stats.failed_deliveries, 1);
    assert_eq!(stats.successful_deliveries, 1);
}

#[tokio::test]
async fn unreachable_destination_counts_failures() {
    let pipeline = Pipeline::start(pipeline_config(unreachable_url())).unwrap();
    let handle = pipeline.handle();

    for _ in 0..3 {
        handle.submit(IntakeBuilder::new().build(), QueueFullPolicy::Block).unwrap();
    }

    pipeline.shutdown().await.unwrap();

    let stats = handle.stats().await;
    assert_eq!(stats.records_processed, 3);
    assert_eq!(stats.failed_deliveries, 3);
    assert_eq!(stats.state, WorkerState::Stopped);
}

#[tokio::test]
async fn shutdown_drains_queued_records() {
    let downstream = MockDownstream::start_empty().await;
    downstream.respond_with_delay(200, Duration::from_millis(50)).await;

    let pipeline = Pipeline::start(pipeline_config(downstream.url())).unwrap();
    let handle = pipeline.handle();

    for i in 0..4 {
        let record = IntakeBuilder::new().event(format!("queued-{i}")).build();
        handle.submit(record, QueueFullPolicy::Block).unwrap();
    }

    pipeline.shutdown().await.unwrap();

    assert_eq!(downstream.received_records().await.len(), 4);
    assert_eq!(handle.queue_depth(), 0);
}

#[tokio::test]
async fn full_queue_under_block_policy_still_delivers_everything() {
    let downstream = MockDownstream::start_empty().await;
    downstream.respond_with_delay(200, Duration::from_millis(20)).await;

    let config = PipelineConfig { queue_capacity: 2, ..pipeline_config(downstream.url()) };
    let pipeline = Pipeline::start(config).unwrap();
    let handle = pipeline.handle();

    for _ in 0..6 {
        handle.submit(IntakeBuilder::new().build(), QueueFullPolicy::Block).unwrap();
    }

    let received = downstream.wait_for_records(6, DELIVERY_WAIT).await;
    assert_eq!(received.len(), 6);

    pipeline.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_delivers_records_deferred_by_full_queue() {
    let downstream = MockDownstream::start_empty().await;
    downstream.respond_with_delay(200, Duration::from_millis(50)).await;

    let config = PipelineConfig { queue_capacity: 1, ..pipeline_config(downstream.url()) };
    let pipeline = Pipeline::start(config).unwrap();
    let handle = pipeline.handle();

    for i in 0..5 {
        let record = IntakeBuilder::new().event(format!("deferred-{i}")).build();
        handle.submit(record, QueueFullPolicy::Block).unwrap();
    }

    pipeline.shutdown().await.unwrap();

    let received = downstream.received_records().await;
    assert_eq!(received.len(), 5);
    assert_eq!(received[0].event, "deferred-0");

    let stats = handle.stats().await;
    assert_eq!(stats.records_processed, 5);
    assert_eq!(stats.state, WorkerState::Stopped);
}

#[tokio::test]
async fn shutdown_times_out_when_worker_cannot_drain() {
    let downstream = MockDownstream::start_empty().await;
    downstream.respond_with_delay(200, Duration::from_secs(5)).await;

    let config = PipelineConfig {
        shutdown_timeout: Duration::from_millis(100),
        ..pipeline_config(downstream.url())
    };
    let pipeline = Pipeline::start(config).unwrap();
    pipeline.handle().submit(IntakeBuilder::new().build(), QueueFullPolicy::Block).unwrap();

    downstream.wait_for_records(1, DELIVERY_WAIT).await;
    let result = pipeline.shutdown().await;

    assert!(matches!(result, Err(beacon_delivery::DeliveryError::ShutdownTimeout { .. })));
}

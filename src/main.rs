//! Beacon event-tracking relay.
//!
//! Main entry point. Loads configuration, starts the delivery pipeline and
//! the HTTP server, and coordinates graceful shutdown.

use anyhow::{Context, Result};
use beacon_api::{AppState, Config};
use beacon_delivery::Pipeline;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    init_tracing(&config.log_filter)?;

    info!("Starting Beacon event-tracking relay");
    info!(
        destination = %config.destination_url,
        queue_capacity = config.queue_capacity,
        queue_full_policy = ?config.queue_full_policy,
        delivery_timeout_seconds = ?config.delivery_timeout_seconds,
        "Configuration loaded"
    );

    let addr = config.parse_server_addr()?;
    let pipeline =
        Pipeline::start(config.to_pipeline_config()).context("Failed to start delivery pipeline")?;

    let state = AppState::new(pipeline.handle(), config.queue_full_policy);
    let server_result = beacon_api::start_server(state, &config.to_server_config(), addr).await;
    if let Err(ref e) = server_result {
        error!(error = %e, "Server failed");
    }

    info!("Draining dispatch queue");
    if let Err(e) = pipeline.shutdown().await {
        error!(error = %e, "Delivery pipeline did not shut down cleanly");
    }

    info!("Beacon shutdown complete");
    server_result.context("HTTP server error")
}

/// Initializes tracing. `RUST_LOG` takes precedence over the configured
/// filter.
fn init_tracing(default_filter: &str) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .context("Invalid log filter")?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
    Ok(())
}

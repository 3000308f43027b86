//! Configuration management for the beacon relay.

use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use axum::http::Uri;
use beacon_delivery::{ClientConfig, PipelineConfig, QueueFullPolicy};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::server::ServerConfig;

const CONFIG_FILE: &str = "beacon.toml";
const ENV_PREFIX: &str = "BEACON_";

/// Complete service configuration with defaults, file, and environment
/// overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables prefixed `BEACON_` (highest priority)
/// 2. Configuration file (`beacon.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// # Example
///
/// ```no_run
/// use beacon_api::Config;
///
/// let config = Config::load().expect("Failed to load configuration");
///
/// println!("Relaying to {}", config.destination_url);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server
    /// Server bind address.
    ///
    /// Environment variable: `BEACON_HOST`
    #[serde(default = "default_host")]
    pub host: String,
    /// Server bind port.
    ///
    /// Environment variable: `BEACON_PORT`
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted request body in bytes.
    ///
    /// Environment variable: `BEACON_MAX_BODY_BYTES`
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// HTTP request timeout in seconds.
    ///
    /// Environment variable: `BEACON_REQUEST_TIMEOUT`
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    // Pipeline
    /// Where every outbound record is posted.
    ///
    /// Environment variable: `BEACON_DESTINATION_URL`
    #[serde(default = "default_destination_url")]
    pub destination_url: String,
    /// Maximum records waiting for delivery.
    ///
    /// Environment variable: `BEACON_QUEUE_CAPACITY`
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Behavior when the queue is full: `block` or `reject`.
    ///
    /// Environment variable: `BEACON_QUEUE_FULL_POLICY`
    #[serde(default)]
    pub queue_full_policy: QueueFullPolicy,
    /// Seconds to wait for the worker to drain on shutdown.
    ///
    /// Environment variable: `BEACON_SHUTDOWN_TIMEOUT_SECONDS`
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,

    // Client
    /// Outbound request timeout in seconds. Unset means no timeout.
    ///
    /// Environment variable: `BEACON_DELIVERY_TIMEOUT_SECONDS`
    #[serde(default)]
    pub delivery_timeout_seconds: Option<u64>,
    /// User agent sent with outbound requests.
    ///
    /// Environment variable: `BEACON_USER_AGENT`
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    // Logging
    /// Default tracing filter. `RUST_LOG` takes precedence when set.
    ///
    /// Environment variable: `BEACON_LOG_FILTER`
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Config {
    /// Load configuration from defaults, config file, and environment variable
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or a value fails
    /// validation.
    pub fn load() -> Result<Self> {
        Self::figment().extract::<Self>().context("Failed to load configuration")?.validated()
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Convert to client configuration.
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: self.delivery_timeout_seconds.map(Duration::from_secs),
            user_agent: self.user_agent.clone(),
            ..ClientConfig::default()
        }
    }

    /// Convert to the delivery crate's pipeline configuration.
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            queue_capacity: self.queue_capacity,
            destination_url: self.destination_url.clone(),
            client_config: self.to_client_config(),
            shutdown_timeout: Duration::from_secs(self.shutdown_timeout_seconds),
        }
    }

    /// Convert to HTTP server limits.
    pub fn to_server_config(&self) -> ServerConfig {
        ServerConfig {
            max_body_bytes: self.max_body_bytes,
            request_timeout: Duration::from_secs(self.request_timeout),
        }
    }

    /// Parse server socket address from host and port configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if host and port do not form a socket address.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if self.queue_capacity == 0 {
            anyhow::bail!("queue_capacity must be greater than 0");
        }

        if self.max_body_bytes == 0 {
            anyhow::bail!("max_body_bytes must be greater than 0");
        }

        if self.delivery_timeout_seconds == Some(0) {
            anyhow::bail!("delivery_timeout_seconds must be greater than 0 when set");
        }

        let uri = Uri::from_str(&self.destination_url).with_context(|| {
            format!("destination_url is not a valid URL: {}", self.destination_url)
        })?;
        if !matches!(uri.scheme_str(), Some("http" | "https")) || uri.authority().is_none() {
            anyhow::bail!("destination_url must be an absolute http or https URL");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            request_timeout: default_request_timeout(),
            destination_url: default_destination_url(),
            queue_capacity: default_queue_capacity(),
            queue_full_policy: QueueFullPolicy::default(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
            delivery_timeout_seconds: None,
            user_agent: default_user_agent(),
            log_filter: default_log_filter(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_request_timeout() -> u64 {
    30
}

fn default_destination_url() -> String {
    beacon_delivery::DEFAULT_DESTINATION_URL.to_string()
}

fn default_queue_capacity() -> usize {
    beacon_delivery::DEFAULT_QUEUE_CAPACITY
}

fn default_shutdown_timeout() -> u64 {
    beacon_delivery::DEFAULT_SHUTDOWN_TIMEOUT_SECONDS
}

fn default_user_agent() -> String {
    "Beacon/1.0".to_string()
}

fn default_log_filter() -> String {
    "info,beacon=debug,tower_http=debug".to_string()
}

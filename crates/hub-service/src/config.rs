//! Hub Service configuration.
//!
//! Configuration is loaded from environment variables. Numeric values that
//! fail to parse or fall outside their range are rejected rather than
//! replaced by defaults.

use crate::actors::ConnectionSettings;
use area_protocol::codec::MAX_FRAME_PAYLOAD;
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default gateway bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default liveness timeout in seconds. Keep-alive pings go out at 90% of it.
pub const DEFAULT_LIVENESS_TIMEOUT_SECONDS: u64 = 60;

/// Default per-write deadline in seconds.
pub const DEFAULT_WRITE_TIMEOUT_SECONDS: u64 = 10;

/// Default inbound frame payload ceiling in bytes.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 4096;

/// Default capacity of each connection's outbound queue.
pub const DEFAULT_OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Default number of consecutive drops before a slow consumer is disconnected.
pub const DEFAULT_MAX_CONSECUTIVE_DROPS: u32 = 64;

/// Default directory service base URL.
pub const DEFAULT_DIRECTORY_SERVICE_URL: &str = "http://127.0.0.1:50051";

/// Default directory request timeout in seconds.
pub const DEFAULT_DIRECTORY_TIMEOUT_SECONDS: u64 = 10;

/// Upper bound for any timeout setting, in seconds (one day).
pub const MAX_TIMEOUT_SECONDS: u64 = 86_400;

/// Hub Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gateway bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Time without a keep-alive reply before a connection is closed.
    pub liveness_timeout: Duration,

    /// Deadline for a single outbound write.
    pub write_timeout: Duration,

    /// Largest accepted inbound frame payload.
    pub max_payload_bytes: usize,

    /// Capacity of each connection's outbound queue.
    pub outbound_queue_capacity: usize,

    /// Consecutive dropped broadcasts after which a member is disconnected.
    pub max_consecutive_drops: u32,

    /// Directory service base URL.
    pub directory_url: String,

    /// Timeout for directory service requests.
    pub directory_timeout: Duration,

    /// Origins allowed to open a WebSocket. Empty allows any origin.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

fn parse_var<T>(vars: &HashMap<String, String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match vars.get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| ConfigError::InvalidValue(format!("{key}={raw}: {e}"))),
        None => Ok(default),
    }
}

fn parse_timeout(
    vars: &HashMap<String, String>,
    key: &str,
    default: u64,
) -> Result<Duration, ConfigError> {
    let seconds: u64 = parse_var(vars, key, default)?;
    if seconds == 0 || seconds > MAX_TIMEOUT_SECONDS {
        return Err(ConfigError::InvalidValue(format!(
            "{key} must be between 1 and {MAX_TIMEOUT_SECONDS}, got {seconds}"
        )));
    }
    Ok(Duration::from_secs(seconds))
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("HUB_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let liveness_timeout = parse_timeout(
            vars,
            "HUB_LIVENESS_TIMEOUT_SECONDS",
            DEFAULT_LIVENESS_TIMEOUT_SECONDS,
        )?;

        let write_timeout = parse_timeout(
            vars,
            "HUB_WRITE_TIMEOUT_SECONDS",
            DEFAULT_WRITE_TIMEOUT_SECONDS,
        )?;

        let max_payload_bytes: usize =
            parse_var(vars, "HUB_MAX_PAYLOAD_BYTES", DEFAULT_MAX_PAYLOAD_BYTES)?;
        if max_payload_bytes == 0 || max_payload_bytes > MAX_FRAME_PAYLOAD {
            return Err(ConfigError::InvalidValue(format!(
                "HUB_MAX_PAYLOAD_BYTES must be between 1 and {MAX_FRAME_PAYLOAD}, got {max_payload_bytes}"
            )));
        }

        let outbound_queue_capacity: usize = parse_var(
            vars,
            "HUB_OUTBOUND_QUEUE_CAPACITY",
            DEFAULT_OUTBOUND_QUEUE_CAPACITY,
        )?;
        if outbound_queue_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "HUB_OUTBOUND_QUEUE_CAPACITY must be positive".to_string(),
            ));
        }

        let max_consecutive_drops: u32 = parse_var(
            vars,
            "HUB_MAX_CONSECUTIVE_DROPS",
            DEFAULT_MAX_CONSECUTIVE_DROPS,
        )?;
        if max_consecutive_drops == 0 {
            return Err(ConfigError::InvalidValue(
                "HUB_MAX_CONSECUTIVE_DROPS must be positive".to_string(),
            ));
        }

        let directory_url = vars
            .get("DIRECTORY_SERVICE_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_DIRECTORY_SERVICE_URL.to_string());
        if reqwest::Url::parse(&directory_url).is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "DIRECTORY_SERVICE_URL is not a valid URL: {directory_url}"
            )));
        }

        let directory_timeout = parse_timeout(
            vars,
            "HUB_DIRECTORY_TIMEOUT_SECONDS",
            DEFAULT_DIRECTORY_TIMEOUT_SECONDS,
        )?;

        let allowed_origins = vars
            .get("HUB_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Config {
            bind_address,
            liveness_timeout,
            write_timeout,
            max_payload_bytes,
            outbound_queue_capacity,
            max_consecutive_drops,
            directory_url,
            directory_timeout,
            allowed_origins,
        })
    }

    /// Per-connection settings derived from this configuration.
    #[must_use]
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            liveness_timeout: self.liveness_timeout,
            write_timeout: self.write_timeout,
            max_payload: self.max_payload_bytes,
            outbound_capacity: self.outbound_queue_capacity,
        }
    }
}

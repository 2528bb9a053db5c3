//! Directory Service configuration.
//!
//! Configuration is loaded from environment variables.

use common::naming::MAX_NAME_LENGTH;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Default bind address for the directory RPC surface.
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:50051";

/// Default length of generated area names.
pub const DEFAULT_AREA_NAME_LENGTH: usize = 10;

/// Default length of generated user names.
pub const DEFAULT_USER_NAME_LENGTH: usize = 8;

/// Directory Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (default: "127.0.0.1:50051").
    pub bind_address: String,

    /// Root directory under which one directory per area is created.
    pub storage_root: PathBuf,

    /// Generated area name length. Longer names shrink the collision risk.
    pub area_name_length: usize,

    /// Generated user name length.
    pub user_name_length: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

fn parse_name_length(
    vars: &HashMap<String, String>,
    key: &str,
    default: usize,
) -> Result<usize, ConfigError> {
    let Some(raw) = vars.get(key) else {
        return Ok(default);
    };

    let len: usize = raw
        .parse()
        .map_err(|e| ConfigError::InvalidValue(format!("{key}={raw}: {e}")))?;

    if len == 0 || len > MAX_NAME_LENGTH {
        return Err(ConfigError::InvalidValue(format!(
            "{key} must be between 1 and {MAX_NAME_LENGTH}, got {len}"
        )));
    }

    Ok(len)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let storage_root = vars
            .get("DIRECTORY_STORAGE_ROOT")
            .ok_or_else(|| ConfigError::MissingEnvVar("DIRECTORY_STORAGE_ROOT".to_string()))
            .map(PathBuf::from)?;

        let bind_address = vars
            .get("DIRECTORY_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let area_name_length = parse_name_length(
            vars,
            "DIRECTORY_AREA_NAME_LENGTH",
            DEFAULT_AREA_NAME_LENGTH,
        )?;

        let user_name_length = parse_name_length(
            vars,
            "DIRECTORY_USER_NAME_LENGTH",
            DEFAULT_USER_NAME_LENGTH,
        )?;

        Ok(Config {
            bind_address,
            storage_root,
            area_name_length,
            user_name_length,
        })
    }
}

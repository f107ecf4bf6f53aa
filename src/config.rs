//! Configuration Module
//!
//! API endpoint, credentials and data directory, read from the environment.

use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "https://zadatak.tcom.rs/zadatak/public/api/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ENV_API_URL: &str = "VEHICLE_API_URL";
const ENV_API_KEY: &str = "VEHICLE_API_KEY";
const ENV_TIMEOUT: &str = "VEHICLE_API_TIMEOUT_SECS";
const ENV_DATA_DIR: &str = "VEHICLE_DATA_DIR";

/// Settings for talking to the rental API
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub data_dir: PathBuf,
}

impl ApiConfig {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            data_dir: default_data_dir(),
        }
    }

    /// Load from `VEHICLE_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup(ENV_API_KEY)
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let base_url = lookup(ENV_API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout_secs = match lookup(ENV_TIMEOUT) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let data_dir = data_dir_from_lookup(&lookup);

        Ok(Self {
            base_url,
            api_key,
            timeout_secs,
            data_dir,
        })
    }
}

/// Data directory from `VEHICLE_DATA_DIR`, needed even without API settings
pub fn data_dir_from_env() -> PathBuf {
    data_dir_from_lookup(&|key: &str| std::env::var(key).ok())
}

pub fn log_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("logs")
}

fn data_dir_from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> PathBuf {
    lookup(ENV_DATA_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(default_data_dir)
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("VehicleFinder")
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("VEHICLE_API_KEY is not set")]
    MissingApiKey,

    #[error("VEHICLE_API_TIMEOUT_SECS is not a whole number of seconds: {0}")]
    InvalidTimeout(String),
}

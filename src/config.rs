//! Client configuration from the environment.
//!
//! A `.env` file in the working directory is loaded first (see `main`),
//! then the `INVENTARIS_*` variables below are read. CLI flags override
//! individual fields afterwards.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::api::routes::DEFAULT_BASE_URL;

pub const ENV_API_URL: &str = "INVENTARIS_API_URL";
pub const ENV_DATA_DIR: &str = "INVENTARIS_DATA_DIR";
pub const ENV_PERSIST_SECRET: &str = "INVENTARIS_PERSIST_SECRET";
pub const ENV_TOKEN_BACKEND: &str = "INVENTARIS_TOKEN_BACKEND";
pub const ENV_TIMEOUT_SECS: &str = "INVENTARIS_TIMEOUT_SECS";

/// Used when no secret is configured. Blobs sealed with it are only as
/// private as the data directory.
pub const DEFAULT_PERSIST_SECRET: &str = "inventaris-local-session";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No data directory available; set {ENV_DATA_DIR}")]
    NoDataDir,
    #[error("Invalid {ENV_TIMEOUT_SECS} value: {0}")]
    InvalidTimeout(String),
    #[error("Unknown token backend '{0}' (expected 'storage' or 'keychain')")]
    InvalidTokenBackend(String),
}

/// Where the bearer token is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenBackend {
    /// `access_token` key in the data directory's storage file.
    #[default]
    Storage,
    /// OS keychain.
    Keychain,
}

impl FromStr for TokenBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "storage" | "file" => Ok(TokenBackend::Storage),
            "keychain" | "keyring" => Ok(TokenBackend::Keychain),
            other => Err(ConfigError::InvalidTokenBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub data_dir: PathBuf,
    pub persist_secret: String,
    pub token_backend: TokenBackend,
    /// Whole-request timeout; `None` leaves it to the transport.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup (the environment, or a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let base_url = non_empty(ENV_API_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let data_dir = match non_empty(ENV_DATA_DIR) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .map(|d| d.join("inventaris"))
                .ok_or(ConfigError::NoDataDir)?,
        };

        let persist_secret = match non_empty(ENV_PERSIST_SECRET) {
            Some(secret) => secret,
            None => {
                log::warn!(
                    "{} not set, using the built-in persistence secret",
                    ENV_PERSIST_SECRET
                );
                DEFAULT_PERSIST_SECRET.to_string()
            }
        };

        let token_backend = match non_empty(ENV_TOKEN_BACKEND) {
            Some(value) => value.parse()?,
            None => TokenBackend::default(),
        };

        let timeout = match non_empty(ENV_TIMEOUT_SECS) {
            Some(value) => {
                let secs: u64 = value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidTimeout(value.clone()))?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            base_url,
            data_dir,
            persist_secret,
            token_backend,
            timeout,
        })
    }
}

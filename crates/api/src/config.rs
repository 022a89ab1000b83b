//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Where conversation history lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local store, lost on restart.
    Memory,
    /// SQLite database at the given URL.
    Sqlite(String),
}

impl StorageBackend {
    fn parse(url: &str) -> Self {
        match url.trim() {
            "" | "memory" => Self::Memory,
            other => Self::Sqlite(other.to_string()),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server bind address.
    pub addr: SocketAddr,
    /// Conversation store.
    pub storage: StorageBackend,
    /// JSON agent manifest. When unset the energy demo agents are registered.
    pub agents_file: Option<PathBuf>,
    /// How often expired sessions are purged. `None` disables the reaper.
    pub reaper_interval: Option<Duration>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `API_ADDR` | Server bind address | `127.0.0.1:8787` |
    /// | `CHAT_STORAGE_URL` | `memory` or a SQLite URL | `memory` |
    /// | `AGENTS_FILE` | Agent manifest path | (energy demo agents) |
    /// | `REAPER_INTERVAL_SECS` | Expiry sweep period, 0 disables | `300` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("API_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8787".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let storage = env::var("CHAT_STORAGE_URL")
            .map(|url| StorageBackend::parse(&url))
            .unwrap_or(StorageBackend::Memory);

        let agents_file = env::var("AGENTS_FILE")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        let reaper_secs = match env::var("REAPER_INTERVAL_SECS") {
            Ok(value) => value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "REAPER_INTERVAL_SECS".to_string(),
                    value,
                })?,
            Err(_) => 300,
        };
        let reaper_interval = (reaper_secs > 0).then(|| Duration::from_secs(reaper_secs));

        Ok(Self {
            addr,
            storage,
            agents_file,
            reaper_interval,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid API_ADDR format")]
    InvalidAddr,

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

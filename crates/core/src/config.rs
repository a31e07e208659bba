use std::path::Path;
use std::time::Duration;

use bustrack_map::MapConfig;
use bustrack_transit::identifiers::{RouteIdentifier, StopIdentifier};
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_ROUTE_ID: &str = "T7890";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid base URL {url:?}: {reason}")]
    BaseUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("Poll interval must be at least one second")]
    PollInterval,

    #[error("Request timeout must be at least one second")]
    RequestTimeout,
}

/// Everything a tracking session needs to know up front.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub base_url: String,
    pub route_id: String,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    /// Stop the rider is waiting at, if any.
    pub target_stop_id: Option<String>,
    pub map: MapConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            route_id: DEFAULT_ROUTE_ID.to_owned(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            target_stop_id: None,
            map: MapConfig::default(),
        }
    }
}

impl TrackerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::PollInterval);
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::RequestTimeout);
        }
        Ok(())
    }

    pub fn route(&self) -> RouteIdentifier {
        RouteIdentifier::new(&self.route_id)
    }

    pub fn target_stop(&self) -> Option<StopIdentifier> {
        self.target_stop_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(StopIdentifier::new)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

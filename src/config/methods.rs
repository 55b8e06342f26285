//! Loading `ScoutConfig` from a file and the environment

use std::path::Path;
use tracing::{debug, warn};

use super::builder::ConfigError;
use super::types::ScoutConfig;

pub const ENV_INGEST_URL: &str = "RATE_SCOUT_INGEST_URL";
pub const ENV_BIND: &str = "RATE_SCOUT_BIND";
pub const ENV_ALLOWED_ORIGINS: &str = "RATE_SCOUT_ALLOWED_ORIGINS";
pub const ENV_HEADLESS: &str = "RATE_SCOUT_HEADLESS";

impl ScoutConfig {
    /// Load config: defaults, then the optional JSON file, then environment
    /// overrides. The result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_env_overrides(|key| std::env::var(key).ok())
            .into_builder()
            .build()
    }

    /// Parse a JSON config file; absent fields keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `RATE_SCOUT_*` overrides read through `lookup`
    #[must_use]
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_INGEST_URL).filter(|v| !v.trim().is_empty()) {
            self.ingest_endpoint = url.trim().to_string();
        }
        if let Some(bind) = lookup(ENV_BIND).filter(|v| !v.trim().is_empty()) {
            self.bridge_bind = bind.trim().to_string();
        }
        if let Some(origins) = lookup(ENV_ALLOWED_ORIGINS) {
            self.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(flag) = lookup(ENV_HEADLESS) {
            match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => self.headless = true,
                "0" | "false" | "no" => self.headless = false,
                other => warn!(value = other, "ignoring unrecognized {ENV_HEADLESS}"),
            }
        }
        self
    }
}

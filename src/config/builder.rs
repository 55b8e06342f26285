//! Fluent builder for `ScoutConfig`
//!
//! Every setter is optional; `build()` validates the combination and returns
//! a [`ConfigError`] describing the first problem found.

use std::path::PathBuf;
use thiserror::Error;
use url::Url;

use super::types::{AdapterTuning, ScoutConfig};
use crate::bridge::origin::OriginPolicy;

/// Configuration validation and loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("job timeout must be greater than zero")]
    ZeroTimeout,

    #[error("adapter max attempts must be greater than zero")]
    ZeroAttempts,

    #[error("ingest endpoint '{endpoint}' is not an absolute http(s) URL")]
    InvalidEndpoint { endpoint: String },

    #[error("allowed origin '{origin}' is not a valid origin")]
    InvalidOrigin { origin: String },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ScoutConfigBuilder {
    config: ScoutConfig,
}

impl ScoutConfig {
    /// Create a builder starting from the defaults
    #[must_use]
    pub fn builder() -> ScoutConfigBuilder {
        ScoutConfigBuilder::default()
    }

    /// Re-open an existing config for modification
    #[must_use]
    pub fn into_builder(self) -> ScoutConfigBuilder {
        ScoutConfigBuilder { config: self }
    }
}

impl ScoutConfigBuilder {
    #[must_use]
    pub fn job_timeout_secs(mut self, secs: u64) -> Self {
        self.config.job_timeout_secs = secs;
        self
    }

    /// Set the inter-job delay policy
    ///
    /// Tests set both values to zero for deterministic spacing.
    #[must_use]
    pub fn delay(mut self, base_delay_ms: u64, jitter_max_ms: u64) -> Self {
        self.config.base_delay_ms = base_delay_ms;
        self.config.jitter_max_ms = jitter_max_ms;
        self
    }

    #[must_use]
    pub fn ingest_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.ingest_endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn envelope_field(mut self, field: Option<String>) -> Self {
        self.config.envelope_field = field;
        self
    }

    #[must_use]
    pub fn default_currency(mut self, currency: impl Into<String>) -> Self {
        self.config.default_currency = currency.into();
        self
    }

    #[must_use]
    pub fn allowed_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn ping_grace_ms(mut self, ms: u64) -> Self {
        self.config.ping_grace_ms = ms;
        self
    }

    #[must_use]
    pub fn bridge_bind(mut self, addr: impl Into<String>) -> Self {
        self.config.bridge_bind = addr.into();
        self
    }

    #[must_use]
    pub fn freshness_max_age_secs(mut self, secs: u64) -> Self {
        self.config.freshness_max_age_secs = secs;
        self
    }

    #[must_use]
    pub fn expansion_days(mut self, days: u32) -> Self {
        self.config.expansion_days = days;
        self
    }

    #[must_use]
    pub fn adapter(mut self, tuning: AdapterTuning) -> Self {
        self.config.adapter = tuning;
        self
    }

    /// Run Chromium without a window (default). Headed mode is for debugging
    /// adapters against a live page.
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    #[must_use]
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = Some(dir.into());
        self
    }

    /// Validate and produce the final config
    pub fn build(self) -> Result<ScoutConfig, ConfigError> {
        let config = self.config;

        if config.job_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if config.adapter.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }

        let endpoint_ok = Url::parse(&config.ingest_endpoint)
            .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
            .unwrap_or(false);
        if !endpoint_ok {
            return Err(ConfigError::InvalidEndpoint {
                endpoint: config.ingest_endpoint,
            });
        }

        if let Some(bad) = config
            .allowed_origins
            .iter()
            .find(|o| !OriginPolicy::is_valid_rule(o))
        {
            return Err(ConfigError::InvalidOrigin { origin: bad.clone() });
        }

        Ok(config)
    }
}

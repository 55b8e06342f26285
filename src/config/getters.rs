//! Getter methods for `ScoutConfig`

use std::path::PathBuf;
use std::time::Duration;

use super::types::{AdapterTuning, ScoutConfig};
use crate::queue::DelayPolicy;
use crate::utils::APP_DIR_NAME;

impl ScoutConfig {
    #[must_use]
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    #[must_use]
    pub fn delay_policy(&self) -> DelayPolicy {
        DelayPolicy::new(
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.jitter_max_ms),
        )
    }

    #[must_use]
    pub fn ingest_endpoint(&self) -> &str {
        &self.ingest_endpoint
    }

    #[must_use]
    pub fn envelope_field(&self) -> Option<&str> {
        self.envelope_field.as_deref()
    }

    #[must_use]
    pub fn default_currency(&self) -> &str {
        &self.default_currency
    }

    #[must_use]
    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    #[must_use]
    pub fn ping_grace(&self) -> Duration {
        Duration::from_millis(self.ping_grace_ms)
    }

    #[must_use]
    pub fn bridge_bind(&self) -> &str {
        &self.bridge_bind
    }

    #[must_use]
    pub fn freshness_max_age(&self) -> Duration {
        Duration::from_secs(self.freshness_max_age_secs)
    }

    #[must_use]
    pub fn expansion_days(&self) -> u32 {
        self.expansion_days
    }

    #[must_use]
    pub fn adapter(&self) -> AdapterTuning {
        self.adapter
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    /// Directory holding persisted state
    ///
    /// Falls back to `<platform data dir>/hotelier-rate-scout`, and to the
    /// working directory when the platform has no data dir.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR_NAME)
        })
    }

    #[must_use]
    pub fn token_path(&self) -> PathBuf {
        self.data_dir().join("session.json")
    }

    #[must_use]
    pub fn freshness_path(&self) -> PathBuf {
        self.data_dir().join("freshness.json")
    }
}

//! Core configuration types for the rate scout
//!
//! `ScoutConfig` carries every tunable of the queue, the executor, the bridge
//! and the reporter. It deserializes from a JSON file where every field is
//! optional and falls back to the defaults in [`crate::utils::constants`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::utils::{
    DEFAULT_ADAPTER_MAX_ATTEMPTS, DEFAULT_ADAPTER_POLL_INTERVAL_MS, DEFAULT_ALLOWED_ORIGINS,
    DEFAULT_BASE_DELAY_MS, DEFAULT_BRIDGE_BIND, DEFAULT_CURRENCY, DEFAULT_EXPANSION_DAYS,
    DEFAULT_FRESHNESS_MAX_AGE_SECS, DEFAULT_INGEST_ENDPOINT, DEFAULT_JITTER_MAX_MS,
    DEFAULT_JOB_TIMEOUT_SECS, DEFAULT_PING_GRACE_MS, DEFAULT_SOLD_OUT_CONFIRM_MS,
    RATES_ENVELOPE_FIELD,
};

/// Main configuration struct for the scraping orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    /// Hard upper bound for one job, from tab creation to adapter signal
    pub(crate) job_timeout_secs: u64,
    pub(crate) base_delay_ms: u64,
    pub(crate) jitter_max_ms: u64,

    pub(crate) ingest_endpoint: String,
    /// Field wrapping the record array; `None` posts a bare array
    pub(crate) envelope_field: Option<String>,
    pub(crate) default_currency: String,

    /// Dashboard origins allowed to reach the background service
    pub(crate) allowed_origins: Vec<String>,
    pub(crate) ping_grace_ms: u64,
    pub(crate) bridge_bind: String,

    /// Rates younger than this are filtered out of incoming batches
    pub(crate) freshness_max_age_secs: u64,
    pub(crate) expansion_days: u32,

    pub(crate) adapter: AdapterTuning,

    pub(crate) headless: bool,
    /// Where the token and freshness files live; platform data dir when unset
    pub(crate) data_dir: Option<PathBuf>,
}

/// Poll-loop parameters rendered into every adapter script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterTuning {
    pub poll_interval_ms: u64,
    pub max_attempts: u32,
    pub sold_out_confirm_ms: u64,
}

impl Default for AdapterTuning {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_ADAPTER_POLL_INTERVAL_MS,
            max_attempts: DEFAULT_ADAPTER_MAX_ATTEMPTS,
            sold_out_confirm_ms: DEFAULT_SOLD_OUT_CONFIRM_MS,
        }
    }
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            job_timeout_secs: DEFAULT_JOB_TIMEOUT_SECS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            jitter_max_ms: DEFAULT_JITTER_MAX_MS,
            ingest_endpoint: DEFAULT_INGEST_ENDPOINT.to_string(),
            envelope_field: Some(RATES_ENVELOPE_FIELD.to_string()),
            default_currency: DEFAULT_CURRENCY.to_string(),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|o| (*o).to_string()).collect(),
            ping_grace_ms: DEFAULT_PING_GRACE_MS,
            bridge_bind: DEFAULT_BRIDGE_BIND.to_string(),
            freshness_max_age_secs: DEFAULT_FRESHNESS_MAX_AGE_SECS,
            expansion_days: DEFAULT_EXPANSION_DAYS,
            adapter: AdapterTuning::default(),
            headless: true,
            data_dir: None,
        }
    }
}

//! Configuration module for the rate scout
//!
//! This module provides the `ScoutConfig` struct, its builder and the
//! file/environment loading used by the binary.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod methods;
pub mod types;

// Re-exports for public API
pub use builder::{ConfigError, ScoutConfigBuilder};
pub use methods::{ENV_ALLOWED_ORIGINS, ENV_BIND, ENV_HEADLESS, ENV_INGEST_URL};
pub use types::{AdapterTuning, ScoutConfig};

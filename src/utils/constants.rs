//! Shared configuration constants for the rate scout
//!
//! Default values used by the config layer, the queue and the executor, kept
//! in one place so the binary, the builder and the tests agree on them.

/// Default hard upper bound for a single scrape job: 45 seconds
///
/// Covers slow OTA pages that lazy-load their room tables. Every job settles
/// no later than this, which is the only forward-progress guarantee a batch
/// has.
pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 45;

/// Fixed part of the pause between two jobs: 2 seconds
pub const DEFAULT_BASE_DELAY_MS: u64 = 2_000;

/// Upper bound of the uniform random jitter added to the base delay
///
/// The resulting spacing of 2-5 seconds keeps consecutive tab opens from
/// looking like a burst from one visitor.
pub const DEFAULT_JITTER_MAX_MS: u64 = 3_000;

/// How long the dashboard waits for a PONG before dispatching anyway
pub const DEFAULT_PING_GRACE_MS: u64 = 500;

/// Rates fetched more recently than this are not scraped again: 6 hours
pub const DEFAULT_FRESHNESS_MAX_AGE_SECS: u64 = 6 * 60 * 60;

/// Interval between adapter extraction attempts inside the page
pub const DEFAULT_ADAPTER_POLL_INTERVAL_MS: u64 = 1_000;

/// Attempts before the adapter gives up and reports sold out
pub const DEFAULT_ADAPTER_MAX_ATTEMPTS: u32 = 15;

/// Delay before a sold-out banner is trusted
///
/// Some sites flash an availability banner while prices are still loading.
pub const DEFAULT_SOLD_OUT_CONFIRM_MS: u64 = 1_500;

/// Currency stamped on records when the adapter does not report one
pub const DEFAULT_CURRENCY: &str = "INR";

/// Room type stamped on records when the adapter does not report one
pub const DEFAULT_ROOM_TYPE: &str = "Standard";

/// Backend rate ingestion endpoint used when nothing is configured
pub const DEFAULT_INGEST_ENDPOINT: &str = "http://127.0.0.1:8001/api/v1/competitors/rates/ingest";

/// Field name wrapping the record array in rate ingestion payloads
pub const RATES_ENVELOPE_FIELD: &str = "rates";

/// Local address the bridge server listens on
pub const DEFAULT_BRIDGE_BIND: &str = "127.0.0.1:8765";

/// Dashboard origins trusted by default (local dev server)
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &["http://localhost:5173", "http://127.0.0.1:5173"];

/// Number of days a competitor is expanded into by default
///
/// Matches the 7-day comparison window the dashboard charts.
pub const DEFAULT_EXPANSION_DAYS: u32 = 7;

/// Name of the page binding adapters report through
pub const ADAPTER_BINDING: &str = "__rateScoutReport";

/// Application directory name under the platform data dir
pub const APP_DIR_NAME: &str = "hotelier-rate-scout";

/// Chrome user agent string for stealth mode
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

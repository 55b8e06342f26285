pub mod adapters;
pub mod bridge;
pub mod browser;
pub mod config;
pub mod context;
pub mod executor;
pub mod freshness;
pub mod jobs;
pub mod persist;
pub mod queue;
pub mod reporter;
pub mod utils;

pub use adapters::{AdapterRegistry, AdapterScript, AdapterSignal, SiteAdapter};
pub use bridge::{
    BackgroundHandle, BackgroundService, BridgeError, ContentScriptRelay, DashboardClient,
    OriginPolicy, PageMessage,
};
pub use browser::ChromiumTabProvider;
pub use config::{ConfigError, ScoutConfig};
pub use context::{TabEvent, TabId, TabOptions, TabProvider};
pub use executor::{JobExecutor, JobState};
pub use freshness::{FreshnessFilter, FreshnessStore};
pub use jobs::{CompetitorId, FailureReason, Job, JobResult, RateRecord};
pub use queue::{DelayPolicy, QueueManager, Queued};
pub use reporter::{HttpReporter, RateSink};

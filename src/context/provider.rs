//! Tab capability the executor drives.
//!
//! The real implementation sits on Chromium (see [`crate::browser`]); tests
//! plug in an in-memory provider so the queue and executor run without a
//! browser.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use super::subscription::TabSubscription;
use crate::adapters::{AdapterScript, AdapterSignal};

/// Opaque identifier of one execution context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

/// Lifecycle and message events published by a provider
#[derive(Debug, Clone, PartialEq)]
pub enum TabEvent {
    /// The document finished loading; fires again on redirects and reloads
    Loaded { tab: TabId },
    /// The injected adapter reported through the page binding
    AdapterMessage { tab: TabId, signal: AdapterSignal },
    /// The tab went away
    Closed { tab: TabId },
}

impl TabEvent {
    #[must_use]
    pub fn tab(&self) -> TabId {
        match self {
            Self::Loaded { tab } | Self::AdapterMessage { tab, .. } | Self::Closed { tab } => *tab,
        }
    }
}

/// How a tab is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabOptions {
    /// Bring the tab to the foreground
    pub active: bool,
}

impl TabOptions {
    /// Inactive tab that does not steal focus from the user
    #[must_use]
    pub fn background() -> Self {
        Self { active: false }
    }
}

/// Errors from the tab capability
#[derive(Error, Debug)]
pub enum TabError {
    #[error("failed to create tab for {url}: {reason}")]
    Create { url: String, reason: String },

    #[error("script injection into {tab} failed: {reason}")]
    Inject { tab: TabId, reason: String },

    #[error("failed to close {tab}: {reason}")]
    Close { tab: TabId, reason: String },

    #[error("unknown {0}")]
    UnknownTab(TabId),
}

/// Creates, scripts and closes isolated tabs
#[async_trait]
pub trait TabProvider: Send + Sync {
    /// Subscribe to events of all tabs; dropping the handle unsubscribes
    fn subscribe(&self) -> TabSubscription;

    async fn open_tab(&self, url: &str, options: TabOptions) -> Result<TabId, TabError>;

    async fn inject(&self, tab: TabId, script: &AdapterScript) -> Result<(), TabError>;

    async fn close_tab(&self, tab: TabId) -> Result<(), TabError>;
}

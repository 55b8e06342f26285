//! Last-fetch bookkeeping per (competitor, check-in date).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

use crate::jobs::CompetitorId;
use crate::persist::{StoreError, read_json, write_json};

#[async_trait]
pub trait FreshnessStore: Send + Sync {
    async fn last_fetched(&self, competitor: &CompetitorId, date: NaiveDate) -> Option<DateTime<Utc>>;

    async fn record_fetch(&self, competitor: &CompetitorId, date: NaiveDate, at: DateTime<Utc>);

    /// Record a whole report at once
    async fn record_fetches(&self, fetched: &[(CompetitorId, NaiveDate)], at: DateTime<Utc>) {
        for (competitor, date) in fetched {
            self.record_fetch(competitor, *date, at).await;
        }
    }
}

/// In-memory index
#[derive(Debug, Default)]
pub struct MemoryFreshnessStore {
    entries: DashMap<(CompetitorId, NaiveDate), DateTime<Utc>>,
}

impl MemoryFreshnessStore {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&self, competitor: &CompetitorId, date: NaiveDate, at: DateTime<Utc>) {
        self.entries
            .entry((competitor.clone(), date))
            .and_modify(|existing| {
                if at > *existing {
                    *existing = at;
                }
            })
            .or_insert(at);
    }

    /// Drop entries fetched before `cutoff`; returns how many went
    fn prune(&self, cutoff: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, fetched_at| *fetched_at >= cutoff);
        before - self.entries.len()
    }

    fn snapshot(&self) -> Vec<FreshnessEntry> {
        let mut entries: Vec<FreshnessEntry> = self
            .entries
            .iter()
            .map(|e| FreshnessEntry {
                competitor_id: e.key().0.clone(),
                check_in_date: e.key().1,
                fetched_at: *e.value(),
            })
            .collect();
        entries.sort_by(|a, b| {
            (&a.competitor_id, a.check_in_date).cmp(&(&b.competitor_id, b.check_in_date))
        });
        entries
    }
}

#[async_trait]
impl FreshnessStore for MemoryFreshnessStore {
    async fn last_fetched(&self, competitor: &CompetitorId, date: NaiveDate) -> Option<DateTime<Utc>> {
        self.entries.get(&(competitor.clone(), date)).map(|e| *e.value())
    }

    async fn record_fetch(&self, competitor: &CompetitorId, date: NaiveDate, at: DateTime<Utc>) {
        self.insert(competitor, date, at);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FreshnessEntry {
    competitor_id: CompetitorId,
    check_in_date: NaiveDate,
    fetched_at: DateTime<Utc>,
}

/// Memory index mirrored to a JSON file after every update
///
/// With a retention set, entries older than it are pruned before each write,
/// so the file only holds pairs that can still count as fresh.
pub struct JsonFreshnessStore {
    path: PathBuf,
    memory: MemoryFreshnessStore,
    retention: Option<chrono::Duration>,
    write_lock: AsyncMutex<()>,
}

impl JsonFreshnessStore {
    /// Open (or start) the index at `path`
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let memory = MemoryFreshnessStore::default();
        let entries: Vec<FreshnessEntry> = read_json(&path).await?.unwrap_or_default();
        for entry in entries {
            memory.insert(&entry.competitor_id, entry.check_in_date, entry.fetched_at);
        }
        Ok(Self {
            path,
            memory,
            retention: None,
            write_lock: AsyncMutex::new(()),
        })
    }

    #[must_use]
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = chrono::Duration::from_std(retention).ok();
        self
    }

    async fn persist(&self, now: DateTime<Utc>) {
        // serialize writers so an older snapshot never overwrites a newer one
        let _guard = self.write_lock.lock().await;
        if let Some(retention) = self.retention {
            let pruned = self.memory.prune(now - retention);
            if pruned > 0 {
                debug!(pruned, "dropped expired freshness entries");
            }
        }
        if let Err(e) = write_json(&self.path, &self.memory.snapshot()).await {
            warn!(path = %self.path.display(), error = %e, "failed to persist freshness index");
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }
}

#[async_trait]
impl FreshnessStore for JsonFreshnessStore {
    async fn last_fetched(&self, competitor: &CompetitorId, date: NaiveDate) -> Option<DateTime<Utc>> {
        self.memory.last_fetched(competitor, date).await
    }

    async fn record_fetch(&self, competitor: &CompetitorId, date: NaiveDate, at: DateTime<Utc>) {
        self.memory.insert(competitor, date, at);
        self.persist(at).await;
    }

    async fn record_fetches(&self, fetched: &[(CompetitorId, NaiveDate)], at: DateTime<Utc>) {
        for (competitor, date) in fetched {
            self.memory.insert(competitor, *date, at);
        }
        self.persist(at).await;
    }
}

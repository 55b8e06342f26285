//! Freshness filter: drop jobs whose rates were fetched recently.

pub mod store;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::jobs::Job;

pub use store::{FreshnessStore, JsonFreshnessStore, MemoryFreshnessStore};

pub struct FreshnessFilter {
    store: Arc<dyn FreshnessStore>,
    max_age: chrono::Duration,
}

impl FreshnessFilter {
    pub fn new(store: Arc<dyn FreshnessStore>, max_age: Duration) -> Self {
        Self {
            store,
            max_age: chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Keep only jobs that must be fetched again, in their original order
    ///
    /// A job is fresh when its (competitor, check-in date) pair was fetched
    /// less than `max_age` before `now`. Jobs without a resolvable date are
    /// always kept.
    pub async fn retain_stale(&self, jobs: Vec<Job>, now: DateTime<Utc>) -> Vec<Job> {
        let total = jobs.len();
        let mut stale = Vec::with_capacity(total);

        for job in jobs {
            let fresh = match job.target_date() {
                Some(date) => self
                    .store
                    .last_fetched(&job.id, date)
                    .await
                    .is_some_and(|at| now.signed_duration_since(at) < self.max_age),
                None => false,
            };
            if fresh {
                debug!(competitor = %job.id, date = ?job.target_date(), "skipping fresh job");
            } else {
                stale.push(job);
            }
        }

        debug!(total, forwarded = stale.len(), "freshness filter applied");
        stale
    }
}

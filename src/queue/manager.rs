//! Single-flight FIFO queue and its drain loop.

use futures::FutureExt;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, warn};

use super::delay::DelayPolicy;
use super::progress::{NoOpProgress, ProgressReporter};
use super::token_store::{MemoryTokenStore, TokenStore};
use crate::executor::JobExecutor;
use crate::jobs::{Job, JobResult};
use crate::persist::StoreError;
use crate::reporter::RateSink;

/// Shared queue state
///
/// Only touched inside short synchronous critical sections; the lock is
/// never held across an await, so `is_processing` is checked and set in one
/// step and exactly one drain loop can exist.
#[derive(Debug, Default)]
pub struct QueueState {
    pending: VecDeque<Job>,
    is_processing: bool,
    auth_token: Option<String>,
}

/// Acknowledgement returned to the submitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Queued {
    pub count: usize,
}

struct QueueInner {
    state: Mutex<QueueState>,
    executor: JobExecutor,
    sink: Arc<dyn RateSink>,
    delay: DelayPolicy,
    tokens: Arc<dyn TokenStore>,
    token_save: AsyncMutex<()>,
    progress: Arc<dyn ProgressReporter>,
}

/// Serial job queue with randomized spacing
#[derive(Clone)]
pub struct QueueManager {
    inner: Arc<QueueInner>,
}

pub struct QueueManagerBuilder {
    executor: JobExecutor,
    sink: Arc<dyn RateSink>,
    delay: DelayPolicy,
    tokens: Arc<dyn TokenStore>,
    progress: Arc<dyn ProgressReporter>,
}

impl QueueManagerBuilder {
    #[must_use]
    pub fn delay(mut self, delay: DelayPolicy) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn token_store(mut self, tokens: Arc<dyn TokenStore>) -> Self {
        self.tokens = tokens;
        self
    }

    #[must_use]
    pub fn progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub fn build(self) -> QueueManager {
        QueueManager {
            inner: Arc::new(QueueInner {
                state: Mutex::new(QueueState::default()),
                executor: self.executor,
                sink: self.sink,
                delay: self.delay,
                tokens: self.tokens,
                token_save: AsyncMutex::new(()),
                progress: self.progress,
            }),
        }
    }
}

impl QueueManager {
    /// Builder with no delay, an in-memory token store and no progress output
    #[must_use]
    pub fn builder(executor: JobExecutor, sink: Arc<dyn RateSink>) -> QueueManagerBuilder {
        QueueManagerBuilder {
            executor,
            sink,
            delay: DelayPolicy::none(),
            tokens: Arc::new(MemoryTokenStore::default()),
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Load the persisted token; call once at process start
    pub async fn restore_token(&self) -> Result<bool, StoreError> {
        let Some(token) = self.inner.tokens.load().await? else {
            return Ok(false);
        };
        let mut state = self.inner.state.lock();
        if state.auth_token.is_none() {
            state.auth_token = Some(token);
            debug!("restored persisted auth token");
        }
        Ok(true)
    }

    /// Append `jobs` and make sure a drain loop is running
    ///
    /// Returns as soon as the jobs are queued; execution happens on a spawned
    /// task. Must be called from within a tokio runtime.
    pub async fn enqueue(&self, jobs: Vec<Job>, token: Option<String>) -> Queued {
        let count = jobs.len();
        let token = token.filter(|t| !t.trim().is_empty());

        let (start_drain, pending, token_changed) = {
            let mut state = self.inner.state.lock();
            state.pending.extend(jobs);

            let token_changed = match &token {
                Some(t) if state.auth_token.as_deref() != Some(t.as_str()) => {
                    state.auth_token = Some(t.clone());
                    true
                }
                _ => false,
            };

            let start_drain = !state.is_processing;
            if start_drain {
                state.is_processing = true;
            }
            (start_drain, state.pending.len(), token_changed)
        };

        self.inner.progress.report_batch_queued(count, pending);
        if start_drain {
            tokio::spawn(Arc::clone(&self.inner).drain());
        } else {
            debug!(count, pending, "drain already running; jobs appended");
        }

        if token_changed {
            self.inner.persist_token().await;
        }

        Queued { count }
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.inner.state.lock().is_processing
    }

    #[must_use]
    pub fn auth_token(&self) -> Option<String> {
        self.inner.state.lock().auth_token.clone()
    }
}

impl QueueInner {
    /// Write the token held in memory right now
    ///
    /// Saves are serialized and each one snapshots `auth_token` after taking
    /// the save lock, so the last write always carries the newest token.
    async fn persist_token(&self) {
        let _guard = self.token_save.lock().await;
        let Some(token) = self.state.lock().auth_token.clone() else {
            return;
        };
        if let Err(e) = self.tokens.save(&token).await {
            warn!(error = %e, "failed to persist auth token");
        }
    }

    async fn drain(self: Arc<Self>) {
        info!("drain loop started");

        while let Some(job) = self.pop_next() {
            self.progress.report_job_started(&job);

            if let Err(panic) = AssertUnwindSafe(self.process(&job)).catch_unwind().await {
                error!(
                    competitor = %job.id,
                    panic = panic_message(panic.as_ref()),
                    "job execution panicked; continuing with next job"
                );
                self.progress.report_job_crashed(&job);
            }

            let pause = self.delay.next_delay(&mut rand::rng());
            debug!(?pause, "pausing before next job");
            tokio::time::sleep(pause).await;
        }

        info!("drain loop finished");
        self.progress.report_queue_drained();
    }

    /// Pop the head job, or mark the loop finished when the queue is empty
    fn pop_next(&self) -> Option<Job> {
        let mut state = self.state.lock();
        let next = state.pending.pop_front();
        if next.is_none() {
            state.is_processing = false;
        }
        next
    }

    async fn process(&self, job: &Job) {
        let result = self.executor.execute(job).await;
        self.progress.report_job_settled(job, &result);

        match result {
            JobResult::Success(records) if records.is_empty() => {
                debug!(competitor = %job.id, "job produced no records; nothing to report");
            }
            JobResult::Success(records) => {
                let token = self.state.lock().auth_token.clone();
                self.sink.report(records, token.as_deref()).await;
            }
            JobResult::Failure(_) => {}
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

//! End-to-end execution of one scrape job in its own tab.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::lifecycle::{JobRun, JobState, Step};
use crate::adapters::{AdapterRegistry, AdapterSignal, SiteAdapter};
use crate::context::{TabEvent, TabId, TabOptions, TabProvider};
use crate::jobs::{FailureReason, Job, JobResult, RateRecord};
use crate::utils::{DEFAULT_CURRENCY, DEFAULT_ROOM_TYPE, check_in_from_url, normalize_job_url};

/// Upper bound on waiting for a tab close during teardown
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs jobs one at a time against a tab provider
pub struct JobExecutor {
    provider: Arc<dyn TabProvider>,
    registry: Arc<AdapterRegistry>,
    timeout: Duration,
    default_currency: String,
}

impl JobExecutor {
    pub fn new(provider: Arc<dyn TabProvider>, registry: Arc<AdapterRegistry>, timeout: Duration) -> Self {
        Self {
            provider,
            registry,
            timeout,
            default_currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    #[must_use]
    pub fn with_default_currency(mut self, currency: impl Into<String>) -> Self {
        self.default_currency = currency.into();
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute `job` and return its settled result
    ///
    /// Never fails: every problem becomes a `JobResult::Failure`. The tab (if
    /// one was opened) is closed before this returns.
    pub async fn execute(&self, job: &Job) -> JobResult {
        let mut run = JobRun::new(Arc::clone(&self.provider));

        let Some(url) = normalize_job_url(&job.url) else {
            warn!(competitor = %job.id, raw_url = %job.url, "job has no usable URL");
            return self.finish(run, job, JobResult::Failure(FailureReason::MissingUrl)).await;
        };

        run.arm_timer(Instant::now() + self.timeout);
        let adapter = self.registry.resolve(&url);

        // subscribe before the tab exists so an early report cannot be missed
        run.listen(self.provider.subscribe(), self.provider.subscribe());
        run.advance(JobState::TabOpening);
        info!(competitor = %job.id, name = %job.name, %url, adapter = adapter.name(), "scrape job started");

        let opened = run
            .until_deadline(self.provider.open_tab(&url, TabOptions::background()))
            .await;
        let tab = match opened {
            None => return self.finish(run, job, JobResult::Failure(FailureReason::Timeout)).await,
            Some(Err(e)) => {
                warn!(competitor = %job.id, error = %e, "tab creation failed");
                return self.finish(run, job, JobResult::Failure(FailureReason::TabFailed)).await;
            }
            Some(Ok(tab)) => tab,
        };
        run.attach_tab(tab);
        debug!(competitor = %job.id, %tab, "tab opened in background");

        let result = self.drive(&mut run, job, &url, tab, adapter.as_ref()).await;
        self.finish(run, job, result).await
    }

    async fn drive(
        &self,
        run: &mut JobRun,
        job: &Job,
        url: &str,
        tab: TabId,
        adapter: &dyn SiteAdapter,
    ) -> JobResult {
        loop {
            match run.next_step(tab).await {
                Step::Deadline => {
                    warn!(competitor = %job.id, %tab, state = ?run.state(), timeout = ?self.timeout, "job timed out");
                    return JobResult::Failure(FailureReason::Timeout);
                }
                Step::Loaded => {
                    run.stop_load_listener();
                    run.advance(JobState::TabLoaded);
                    debug!(competitor = %job.id, %tab, adapter = adapter.name(), "page loaded; injecting adapter");

                    match run.until_deadline(self.provider.inject(tab, adapter.script())).await {
                        None => return JobResult::Failure(FailureReason::Timeout),
                        Some(Err(e)) => {
                            warn!(competitor = %job.id, error = %e, "adapter injection failed");
                            return JobResult::Failure(FailureReason::InjectionFailed);
                        }
                        Some(Ok(())) => {
                            run.advance(JobState::AdapterInjected);
                            run.advance(JobState::AwaitingResult);
                        }
                    }
                }
                Step::Event(TabEvent::AdapterMessage { signal, .. }) => {
                    return self.normalize(job, url, signal);
                }
                Step::Event(TabEvent::Closed { .. }) => {
                    warn!(competitor = %job.id, %tab, "tab closed before the adapter reported");
                    return JobResult::Failure(FailureReason::TabFailed);
                }
                Step::Event(TabEvent::Loaded { .. }) => {}
                Step::ProviderGone => {
                    warn!(competitor = %job.id, %tab, "tab provider went away");
                    return JobResult::Failure(FailureReason::TabFailed);
                }
            }
        }
    }

    /// Turn an adapter signal into records tagged with the job's competitor
    fn normalize(&self, job: &Job, url: &str, signal: AdapterSignal) -> JobResult {
        if !signal.success {
            warn!(
                competitor = %job.id,
                error = signal.error.as_deref().unwrap_or("unspecified"),
                "adapter reported an error"
            );
            return JobResult::Failure(FailureReason::AdapterError);
        }

        let fallback_date = job.target_date().or_else(|| check_in_from_url(url));
        let records: Vec<RateRecord> = signal
            .into_rates()
            .into_iter()
            .filter_map(|rate| {
                let Some(check_in_date) = rate.check_in_date.or(fallback_date) else {
                    warn!(competitor = %job.id, "dropping rate without a check-in date");
                    return None;
                };
                Some(RateRecord {
                    competitor_id: job.id.clone(),
                    check_in_date,
                    price: rate.price.unwrap_or(0.0),
                    room_type: rate
                        .room_type
                        .filter(|r| !r.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_ROOM_TYPE.to_string()),
                    // unknown price means unavailable
                    is_sold_out: rate.is_sold_out || rate.price.is_none(),
                    currency: rate.currency.unwrap_or_else(|| self.default_currency.clone()),
                    source_url: url.to_string(),
                })
            })
            .collect();

        JobResult::Success(records)
    }

    /// Single convergence point of every resolution path
    async fn finish(&self, mut run: JobRun, job: &Job, result: JobResult) -> JobResult {
        run.settle(result);

        if let Some(teardown) = run.teardown()
            && let Some(tab) = teardown.tab
        {
            match tokio::time::timeout(CLOSE_TIMEOUT, self.provider.close_tab(tab)).await {
                Ok(Ok(())) => debug!(competitor = %job.id, %tab, "tab closed"),
                Ok(Err(e)) => debug!(competitor = %job.id, %tab, error = %e, "tab close failed (ignored)"),
                Err(_) => warn!(competitor = %job.id, %tab, "tab close timed out (ignored)"),
            }
        }

        let state = run.state();
        let result = run.into_result();
        match &result {
            JobResult::Success(records) => {
                info!(competitor = %job.id, records = records.len(), "scrape job resolved");
            }
            JobResult::Failure(reason) => {
                info!(competitor = %job.id, %reason, ?state, "scrape job failed");
            }
        }
        result
    }
}

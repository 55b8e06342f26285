//! Test utilities shared by the rate scout integration tests

use async_trait::async_trait;
use chrono::NaiveDate;
use hotelier_rate_scout::adapters::{AdapterRegistry, AdapterScript, AdapterSignal};
use hotelier_rate_scout::config::AdapterTuning;
use hotelier_rate_scout::context::{
    TabError, TabEvent, TabEventHub, TabId, TabOptions, TabProvider, TabSubscription,
};
use hotelier_rate_scout::jobs::{CompetitorId, Job, JobResult, RateRecord};
use hotelier_rate_scout::queue::ProgressReporter;
use hotelier_rate_scout::reporter::RateSink;
use hotelier_rate_scout::JobExecutor;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

/// What `open_tab` does for a URL
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, Default)]
pub enum OpenBehavior {
    #[default]
    Open,
    Fail,
    Panic,
    Hang,
}

/// Scripted page behavior keyed by URL
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct PageScript {
    pub open: OpenBehavior,
    pub load_after: Duration,
    /// Extra load events after the first one (redirects)
    pub extra_loads: usize,
    pub inject_fails: bool,
    /// Adapter report sent this long after injection
    pub respond: Option<(Duration, AdapterSignal)>,
    /// Publish `Closed` right after injection
    pub crash_after_inject: bool,
}

impl Default for PageScript {
    fn default() -> Self {
        Self {
            open: OpenBehavior::Open,
            load_after: Duration::from_millis(200),
            extra_loads: 0,
            inject_fails: false,
            respond: None,
            crash_after_inject: false,
        }
    }
}

#[allow(dead_code)]
impl PageScript {
    pub fn responding(signal: AdapterSignal) -> Self {
        Self {
            respond: Some((Duration::from_millis(300), signal)),
            ..Self::default()
        }
    }

    pub fn silent() -> Self {
        Self::default()
    }
}

#[derive(Debug, Default)]
pub struct ProviderLog {
    pub opened: Vec<(TabId, String, TabOptions)>,
    pub injected: Vec<(TabId, String)>,
    pub closed: Vec<TabId>,
}

/// In-memory tab provider driven by per-URL scripts
#[derive(Default)]
pub struct FakeTabProvider {
    hub: TabEventHub,
    scripts: Mutex<HashMap<String, PageScript>>,
    fallback: Mutex<PageScript>,
    next_id: AtomicU64,
    live: Mutex<HashMap<TabId, PageScript>>,
    log: Mutex<ProviderLog>,
}

#[allow(dead_code)]
impl FakeTabProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, url: &str, script: PageScript) {
        self.scripts.lock().insert(url.to_string(), script);
    }

    pub fn script_all(&self, script: PageScript) {
        *self.fallback.lock() = script;
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.log.lock().opened.iter().map(|(_, url, _)| url.clone()).collect()
    }

    pub fn opened(&self) -> Vec<(TabId, String, TabOptions)> {
        self.log.lock().opened.clone()
    }

    pub fn injected(&self) -> Vec<(TabId, String)> {
        self.log.lock().injected.clone()
    }

    pub fn closed(&self) -> Vec<TabId> {
        self.log.lock().closed.clone()
    }

    pub fn live_tabs(&self) -> usize {
        self.live.lock().len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count()
    }

    fn script_for(&self, url: &str) -> PageScript {
        self.scripts
            .lock()
            .get(url)
            .cloned()
            .unwrap_or_else(|| self.fallback.lock().clone())
    }
}

#[async_trait]
impl TabProvider for FakeTabProvider {
    fn subscribe(&self) -> TabSubscription {
        self.hub.subscribe()
    }

    async fn open_tab(&self, url: &str, options: TabOptions) -> Result<TabId, TabError> {
        let script = self.script_for(url);
        match script.open {
            OpenBehavior::Open => {}
            OpenBehavior::Fail => {
                return Err(TabError::Create {
                    url: url.to_string(),
                    reason: "refused".into(),
                });
            }
            OpenBehavior::Panic => panic!("tab provider blew up on {url}"),
            OpenBehavior::Hang => std::future::pending::<()>().await,
        }

        let tab = TabId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.log.lock().opened.push((tab, url.to_string(), options));
        self.live.lock().insert(tab, script.clone());

        let hub = self.hub.clone();
        tokio::spawn(async move {
            tokio::time::sleep(script.load_after).await;
            hub.publish(TabEvent::Loaded { tab });
            for _ in 0..script.extra_loads {
                tokio::time::sleep(Duration::from_millis(50)).await;
                hub.publish(TabEvent::Loaded { tab });
            }
        });
        Ok(tab)
    }

    async fn inject(&self, tab: TabId, script: &AdapterScript) -> Result<(), TabError> {
        let page = self.live.lock().get(&tab).cloned().ok_or(TabError::UnknownTab(tab))?;
        self.log.lock().injected.push((tab, script.name().to_string()));

        if page.inject_fails {
            return Err(TabError::Inject {
                tab,
                reason: "script threw".into(),
            });
        }
        if page.crash_after_inject {
            self.hub.publish(TabEvent::Closed { tab });
        }
        if let Some((delay, signal)) = page.respond {
            let hub = self.hub.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                hub.publish(TabEvent::AdapterMessage { tab, signal });
            });
        }
        Ok(())
    }

    async fn close_tab(&self, tab: TabId) -> Result<(), TabError> {
        self.log.lock().closed.push(tab);
        self.live
            .lock()
            .remove(&tab)
            .map(|_| ())
            .ok_or(TabError::UnknownTab(tab))
    }
}

/// Executor over `provider` with the built-in adapters
#[allow(dead_code)]
pub fn executor(provider: Arc<FakeTabProvider>, timeout: Duration) -> JobExecutor {
    let registry = AdapterRegistry::builtin(AdapterTuning::default()).expect("built-in adapters render");
    JobExecutor::new(provider, Arc::new(registry), timeout)
}

#[allow(dead_code)]
pub fn check_in() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 11, 2).expect("valid date")
}

/// Rate scrape job for the fixed test check-in date
#[allow(dead_code)]
pub fn job(id: &str, url: &str) -> Job {
    Job::rate_scrape(id, format!("Hotel {id}"), url).with_check_in(check_in())
}

/// Sink that keeps every report
#[derive(Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<(Vec<RateRecord>, Option<String>)>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reports(&self) -> Vec<(Vec<RateRecord>, Option<String>)> {
        self.reports.lock().clone()
    }
}

#[async_trait]
impl RateSink for RecordingSink {
    async fn report(&self, records: Vec<RateRecord>, token: Option<&str>) {
        self.reports.lock().push((records, token.map(str::to_string)));
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    Queued { count: usize, pending: usize },
    Started(CompetitorId),
    Settled(CompetitorId, JobResult),
    Crashed(CompetitorId),
    Drained,
}

/// Progress reporter forwarding every event over a channel
pub struct RecordingProgress {
    tx: mpsc::UnboundedSender<Progress>,
}

#[allow(dead_code)]
impl RecordingProgress {
    pub fn channel() -> (Arc<Self>, mpsc::UnboundedReceiver<Progress>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl ProgressReporter for RecordingProgress {
    fn report_batch_queued(&self, count: usize, pending: usize) {
        let _ = self.tx.send(Progress::Queued { count, pending });
    }

    fn report_job_started(&self, job: &Job) {
        let _ = self.tx.send(Progress::Started(job.id.clone()));
    }

    fn report_job_settled(&self, job: &Job, result: &JobResult) {
        let _ = self.tx.send(Progress::Settled(job.id.clone(), result.clone()));
    }

    fn report_job_crashed(&self, job: &Job) {
        let _ = self.tx.send(Progress::Crashed(job.id.clone()));
    }

    fn report_queue_drained(&self) {
        let _ = self.tx.send(Progress::Drained);
    }
}

/// Collect progress events up to and including `Drained`
#[allow(dead_code)]
pub async fn until_drained(rx: &mut mpsc::UnboundedReceiver<Progress>) -> Vec<Progress> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        let done = event == Progress::Drained;
        events.push(event);
        if done {
            break;
        }
    }
    events
}

#[allow(dead_code)]
pub fn started(events: &[Progress]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            Progress::Started(id) => Some(id.to_string()),
            _ => None,
        })
        .collect()
}

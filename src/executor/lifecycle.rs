//! Per-job state machine and the resources it owns.
//!
//! A `JobRun` holds everything that can still resolve a job: the deadline
//! timer, the tab-scoped message subscription, the load subscription and the
//! tab itself. Settling is a guarded state transition; whichever trigger gets
//! there first wins and every later attempt is a no-op. Teardown releases all
//! resources exactly once.

use std::future::{Future, pending};
use std::pin::Pin;
use std::sync::Arc;
use tokio::time::{Instant, Sleep, sleep_until};
use tracing::{debug, warn};

use crate::context::{TabEvent, TabId, TabProvider, TabSubscription};
use crate::jobs::{FailureReason, JobResult};

/// Where a job is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Created,
    TabOpening,
    TabLoaded,
    AdapterInjected,
    AwaitingResult,
    Resolved,
    TimedOut,
    Failed(FailureReason),
}

impl JobState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::TimedOut | Self::Failed(_))
    }

    fn settled_by(result: &JobResult) -> Self {
        match result {
            JobResult::Success(_) => Self::Resolved,
            JobResult::Failure(FailureReason::Timeout) => Self::TimedOut,
            JobResult::Failure(reason) => Self::Failed(*reason),
        }
    }
}

/// What woke the executor up
#[derive(Debug)]
pub(crate) enum Step {
    Deadline,
    Loaded,
    Event(TabEvent),
    ProviderGone,
}

/// One execution of one job
pub struct JobRun {
    state: JobState,
    outcome: Option<JobResult>,
    provider: Arc<dyn TabProvider>,
    tab: Option<TabId>,
    timer: Option<Pin<Box<Sleep>>>,
    messages: Option<TabSubscription>,
    loads: Option<TabSubscription>,
    torn_down: bool,
}

impl JobRun {
    #[must_use]
    pub fn new(provider: Arc<dyn TabProvider>) -> Self {
        Self {
            state: JobState::Created,
            outcome: None,
            provider,
            tab: None,
            timer: None,
            messages: None,
            loads: None,
            torn_down: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> JobState {
        self.state
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&JobResult> {
        self.outcome.as_ref()
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.outcome.is_some()
    }

    /// Move to a non-terminal state; ignored once settled
    pub fn advance(&mut self, next: JobState) -> bool {
        if self.is_settled() || next.is_terminal() {
            return false;
        }
        self.state = next;
        true
    }

    /// Settle the job. Returns `false` if it was already settled, in which
    /// case the first result stands.
    pub fn settle(&mut self, result: JobResult) -> bool {
        if self.is_settled() {
            debug!(state = ?self.state, "ignoring resolution of an already settled job");
            return false;
        }
        self.state = JobState::settled_by(&result);
        self.outcome = Some(result);
        true
    }

    pub fn arm_timer(&mut self, deadline: Instant) {
        self.timer = Some(Box::pin(sleep_until(deadline)));
    }

    /// Install the message and load subscriptions before the tab exists
    pub fn listen(&mut self, messages: TabSubscription, loads: TabSubscription) {
        self.messages = Some(messages);
        self.loads = Some(loads);
    }

    pub fn attach_tab(&mut self, tab: TabId) {
        self.tab = Some(tab);
    }

    #[must_use]
    pub fn tab(&self) -> Option<TabId> {
        self.tab
    }

    /// Drop the load subscription so later loads cannot trigger injection
    pub fn stop_load_listener(&mut self) {
        self.loads = None;
    }

    #[must_use]
    pub fn has_listeners(&self) -> bool {
        self.messages.is_some() || self.loads.is_some()
    }

    /// Run `fut` unless the deadline fires first
    pub async fn until_deadline<F: Future>(&mut self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            () = wait_timer(&mut self.timer) => None,
            out = fut => Some(out),
        }
    }

    pub(crate) async fn next_step(&mut self, tab: TabId) -> Step {
        let Self {
            timer,
            messages,
            loads,
            ..
        } = self;

        tokio::select! {
            biased;
            () = wait_timer(timer) => Step::Deadline,
            loaded = wait_load(loads, tab) => match loaded {
                Some(()) => Step::Loaded,
                None => Step::ProviderGone,
            },
            event = wait_message(messages, tab) => match event {
                Some(event) => Step::Event(event),
                None => Step::ProviderGone,
            },
        }
    }

    /// Release timer, listeners and tab; `None` after the first call
    pub fn teardown(&mut self) -> Option<Teardown> {
        if self.torn_down {
            return None;
        }
        self.torn_down = true;
        self.timer = None;
        self.messages = None;
        self.loads = None;
        Some(Teardown {
            tab: self.tab.take(),
        })
    }

    /// Final result; a run that somehow never settled counts as a tab failure
    #[must_use]
    pub fn into_result(mut self) -> JobResult {
        self.outcome
            .take()
            .unwrap_or(JobResult::Failure(FailureReason::TabFailed))
    }
}

impl Drop for JobRun {
    fn drop(&mut self) {
        // Reached with a live tab only if the executing future was dropped
        // mid-flight (panic or cancellation).
        let Some(tab) = self.tab.take() else {
            return;
        };
        warn!(%tab, "job run dropped without teardown - closing tab in background");
        let provider = Arc::clone(&self.provider);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = provider.close_tab(tab).await {
                    debug!(%tab, error = %e, "background tab close failed");
                }
            });
        }
    }
}

/// Resources left to release after a run settles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Teardown {
    pub tab: Option<TabId>,
}

async fn wait_timer(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(timer) => timer.as_mut().await,
        None => pending().await,
    }
}

async fn wait_load(loads: &mut Option<TabSubscription>, tab: TabId) -> Option<()> {
    match loads {
        Some(loads) => loads.loaded(tab).await,
        None => pending().await,
    }
}

async fn wait_message(messages: &mut Option<TabSubscription>, tab: TabId) -> Option<TabEvent> {
    match messages {
        Some(messages) => messages.recv_for(tab).await,
        None => pending().await,
    }
}

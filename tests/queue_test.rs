//! Queue manager: FIFO order, single drain loop, crash isolation and token handling

use hotelier_rate_scout::adapters::AdapterSignal;
use hotelier_rate_scout::jobs::{FailureReason, JobResult};
use hotelier_rate_scout::queue::{
    DelayPolicy, FileTokenStore, MemoryTokenStore, QueueManager, TokenStore,
};
use async_trait::async_trait;
use hotelier_rate_scout::persist::StoreError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

mod common;
use common::{
    FakeTabProvider, OpenBehavior, PageScript, Progress, RecordingProgress, RecordingSink, executor, job,
    started, until_drained,
};

const TIMEOUT: Duration = Duration::from_secs(45);

fn responding_provider() -> Arc<FakeTabProvider> {
    let provider = FakeTabProvider::new();
    provider.script_all(PageScript::responding(AdapterSignal::rate(4200.0, "Deluxe", false)));
    provider
}

#[tokio::test(start_paused = true)]
async fn test_jobs_run_in_submission_order() {
    let provider = responding_provider();
    let sink = RecordingSink::new();
    let (progress, mut events) = RecordingProgress::channel();
    let queue = QueueManager::builder(executor(provider.clone(), TIMEOUT), sink.clone())
        .delay(DelayPolicy::new(Duration::from_secs(2), Duration::from_secs(3)))
        .progress(progress)
        .build();

    let queued = queue
        .enqueue(
            vec![
                job("A", "https://a.example/"),
                job("B", "https://b.example/"),
                job("C", "https://c.example/"),
            ],
            None,
        )
        .await;
    assert_eq!(queued.count, 3);
    assert!(queue.is_processing());

    let events = until_drained(&mut events).await;
    assert_eq!(started(&events), ["A", "B", "C"]);
    assert_eq!(
        provider.opened_urls(),
        ["https://a.example/", "https://b.example/", "https://c.example/"]
    );
    assert_eq!(sink.reports().len(), 3);
    assert!(!queue.is_processing());
    assert_eq!(queue.pending_len(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_batch_submitted_mid_drain_is_appended_without_second_loop() {
    let provider = responding_provider();
    let sink = RecordingSink::new();
    let (progress, mut events) = RecordingProgress::channel();
    let queue = QueueManager::builder(executor(provider.clone(), TIMEOUT), sink.clone())
        .delay(DelayPolicy::new(Duration::from_secs(2), Duration::from_secs(3)))
        .progress(progress)
        .build();

    queue
        .enqueue(
            vec![
                job("A", "https://a.example/"),
                job("B", "https://b.example/"),
                job("C", "https://c.example/"),
            ],
            None,
        )
        .await;

    let mut seen = Vec::new();
    loop {
        let event = events.recv().await.expect("progress channel open");
        let a_settled = matches!(&event, Progress::Settled(id, _) if id.as_str() == "A");
        seen.push(event);
        if a_settled {
            break;
        }
    }

    let queued = queue.enqueue(vec![job("D", "https://d.example/")], None).await;
    assert_eq!(queued.count, 1);
    assert!(queue.is_processing());

    seen.extend(until_drained(&mut events).await);
    assert_eq!(started(&seen), ["A", "B", "C", "D"]);
    assert_eq!(seen.iter().filter(|e| **e == Progress::Drained).count(), 1);

    // one tab at a time: every tab was closed before the next one opened
    let opened: Vec<_> = provider.opened().into_iter().map(|(tab, _, _)| tab).collect();
    assert_eq!(provider.closed(), opened);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_job_does_not_stop_the_queue() {
    let provider = responding_provider();
    provider.script(
        "https://boom.example/",
        PageScript {
            open: OpenBehavior::Panic,
            ..PageScript::default()
        },
    );
    let sink = RecordingSink::new();
    let (progress, mut events) = RecordingProgress::channel();
    let queue = QueueManager::builder(executor(provider.clone(), TIMEOUT), sink.clone())
        .progress(progress)
        .build();

    queue
        .enqueue(
            vec![
                job("A", "https://a.example/"),
                job("BOOM", "https://boom.example/"),
                job("C", "https://c.example/"),
            ],
            None,
        )
        .await;

    let events = until_drained(&mut events).await;
    assert_eq!(started(&events), ["A", "BOOM", "C"]);
    assert!(events.contains(&Progress::Crashed("BOOM".into())));
    assert_eq!(sink.reports().len(), 2);
    assert!(!queue.is_processing());
}

#[tokio::test(start_paused = true)]
async fn test_failures_are_not_reported() {
    let provider = FakeTabProvider::new();
    provider.script_all(PageScript::silent());
    let sink = RecordingSink::new();
    let (progress, mut events) = RecordingProgress::channel();
    let queue = QueueManager::builder(executor(provider, TIMEOUT), sink.clone())
        .progress(progress)
        .build();

    queue
        .enqueue(vec![job("A", "https://a.example/"), job("B", "")], None)
        .await;

    let events = until_drained(&mut events).await;
    assert!(events.contains(&Progress::Settled("A".into(), JobResult::Failure(FailureReason::Timeout))));
    assert!(events.contains(&Progress::Settled("B".into(), JobResult::Failure(FailureReason::MissingUrl))));
    assert!(sink.reports().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_reports_carry_the_latest_token() {
    let provider = responding_provider();
    let sink = RecordingSink::new();
    let (progress, mut events) = RecordingProgress::channel();
    let tokens = Arc::new(MemoryTokenStore::default());
    let queue = QueueManager::builder(executor(provider, TIMEOUT), sink.clone())
        .token_store(tokens.clone())
        .progress(progress)
        .build();

    queue
        .enqueue(vec![job("A", "https://a.example/")], Some("tok-1".into()))
        .await;
    until_drained(&mut events).await;

    // an empty token keeps the current one
    queue.enqueue(vec![job("B", "https://b.example/")], Some("  ".into())).await;
    until_drained(&mut events).await;

    let reports = sink.reports();
    assert_eq!(reports[0].1.as_deref(), Some("tok-1"));
    assert_eq!(reports[1].1.as_deref(), Some("tok-1"));
    assert_eq!(tokens.current().as_deref(), Some("tok-1"));
}

#[tokio::test(start_paused = true)]
async fn test_restarted_drain_after_idle() {
    let provider = responding_provider();
    let sink = RecordingSink::new();
    let (progress, mut events) = RecordingProgress::channel();
    let queue = QueueManager::builder(executor(provider, TIMEOUT), sink.clone())
        .progress(progress)
        .build();

    queue.enqueue(vec![job("A", "https://a.example/")], None).await;
    until_drained(&mut events).await;
    assert!(!queue.is_processing());

    queue.enqueue(vec![job("B", "https://b.example/")], None).await;
    let events = until_drained(&mut events).await;
    assert_eq!(started(&events), ["B"]);
    assert_eq!(sink.reports().len(), 2);
}

#[tokio::test]
async fn test_token_survives_restart_via_file_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");

    let provider = FakeTabProvider::new();
    let queue = QueueManager::builder(executor(provider.clone(), TIMEOUT), RecordingSink::new())
        .token_store(Arc::new(FileTokenStore::new(&path)))
        .build();
    queue.enqueue(Vec::new(), Some("persisted".into())).await;

    let on_disk = FileTokenStore::new(&path).load().await.unwrap();
    assert_eq!(on_disk.as_deref(), Some("persisted"));

    let restarted = QueueManager::builder(executor(provider, TIMEOUT), RecordingSink::new())
        .token_store(Arc::new(FileTokenStore::new(&path)))
        .build();
    assert_eq!(restarted.auth_token(), None);
    assert!(restarted.restore_token().await.unwrap());
    assert_eq!(restarted.auth_token().as_deref(), Some("persisted"));
}

#[tokio::test]
async fn test_restore_without_session_file() {
    let dir = TempDir::new().unwrap();
    let queue = QueueManager::builder(executor(FakeTabProvider::new(), TIMEOUT), RecordingSink::new())
        .token_store(Arc::new(FileTokenStore::new(dir.path().join("missing.json"))))
        .build();

    assert!(!queue.restore_token().await.unwrap());
    assert_eq!(queue.auth_token(), None);
}

/// Token store whose first save is slow, recording the order writes land in
#[derive(Default)]
struct SlowFirstSave {
    landed: Mutex<Vec<String>>,
    calls: Mutex<usize>,
}

#[async_trait]
impl TokenStore for SlowFirstSave {
    async fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.landed.lock().last().cloned())
    }

    async fn save(&self, token: &str) -> Result<(), StoreError> {
        let first = {
            let mut calls = self.calls.lock();
            *calls += 1;
            *calls == 1
        };
        if first {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        self.landed.lock().push(token.to_string());
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_submissions_persist_the_newest_token() {
    let tokens = Arc::new(SlowFirstSave::default());
    let queue = QueueManager::builder(executor(FakeTabProvider::new(), TIMEOUT), RecordingSink::new())
        .token_store(tokens.clone())
        .build();

    tokio::join!(
        queue.enqueue(Vec::new(), Some("tok-old".into())),
        queue.enqueue(Vec::new(), Some("tok-new".into())),
    );

    assert_eq!(queue.auth_token().as_deref(), Some("tok-new"));
    assert_eq!(tokens.load().await.unwrap().as_deref(), Some("tok-new"));
}

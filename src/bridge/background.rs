//! Privileged side of the bridge: owns the queue and the freshness filter.

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::BridgeError;
use super::messages::{ExtensionMessage, QueuedAck};
use crate::freshness::FreshnessFilter;
use crate::queue::QueueManager;

struct Request {
    message: ExtensionMessage,
    reply: oneshot::Sender<QueuedAck>,
}

/// Sending half held by relays
#[derive(Clone)]
pub struct BackgroundHandle {
    tx: mpsc::Sender<Request>,
}

impl BackgroundHandle {
    /// Send a message and wait for the acknowledgement
    ///
    /// A stopped service, or one that drops the reply, yields
    /// [`BridgeError::Disconnected`].
    pub async fn send(&self, message: ExtensionMessage) -> Result<QueuedAck, BridgeError> {
        let (reply, ack) = oneshot::channel();
        self.tx
            .send(Request { message, reply })
            .await
            .map_err(|_| BridgeError::Disconnected)?;
        ack.await.map_err(|_| BridgeError::Disconnected)
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }
}

pub struct BackgroundService {
    queue: QueueManager,
    freshness: Option<FreshnessFilter>,
}

impl BackgroundService {
    #[must_use]
    pub fn new(queue: QueueManager) -> Self {
        Self {
            queue,
            freshness: None,
        }
    }

    #[must_use]
    pub fn with_freshness(mut self, filter: FreshnessFilter) -> Self {
        self.freshness = Some(filter);
        self
    }

    /// Filter and enqueue a batch; the ack count is what was actually queued
    pub async fn handle(&self, message: ExtensionMessage) -> QueuedAck {
        match message {
            ExtensionMessage::StartScrape { data, token } => {
                let received = data.len();
                let jobs = match &self.freshness {
                    Some(filter) => filter.retain_stale(data, Utc::now()).await,
                    None => data,
                };
                let queued = self.queue.enqueue(jobs, token).await;
                info!(received, queued = queued.count, "scrape batch accepted");
                QueuedAck::queued(queued.count)
            }
        }
    }

    /// Run the service on its own task
    pub fn spawn(self, capacity: usize) -> (BackgroundHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<Request>(capacity.max(1));
        let task = tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                let ack = self.handle(request.message).await;
                if request.reply.send(ack).is_err() {
                    debug!("bridge caller went away before the ack");
                }
            }
            debug!("background service stopped");
        });
        (BackgroundHandle { tx }, task)
    }
}

//! Dashboard side of the bridge: PING, wait briefly for PONG, then dispatch.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::BridgeError;
use super::messages::PageMessage;
use super::relay::{ContentScriptRelay, RelayOutcome};
use crate::jobs::Job;

/// Transport carrying page messages to a relay
#[async_trait]
pub trait PageChannel: Send + Sync {
    /// Post `message`; `Ok(None)` when the relay had nothing to say
    async fn post(&self, message: PageMessage) -> Result<Option<PageMessage>, BridgeError>;
}

/// In-process channel straight into a relay
pub struct LocalPageChannel {
    relay: Arc<ContentScriptRelay>,
    origin: String,
}

impl LocalPageChannel {
    pub fn new(relay: Arc<ContentScriptRelay>, origin: impl Into<String>) -> Self {
        Self {
            relay,
            origin: origin.into(),
        }
    }
}

#[async_trait]
impl PageChannel for LocalPageChannel {
    async fn post(&self, message: PageMessage) -> Result<Option<PageMessage>, BridgeError> {
        match self.relay.handle(Some(&self.origin), message).await {
            RelayOutcome::Reply(reply) | RelayOutcome::Rejected(reply) => Ok(Some(reply)),
            RelayOutcome::Ignored => Ok(None),
        }
    }
}

/// Channel to a bridge server over HTTP, presenting `origin`
pub struct HttpPageChannel {
    client: Client,
    url: String,
    origin: String,
}

impl HttpPageChannel {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:8765`
    pub fn new(client: Client, base_url: &str, origin: impl Into<String>) -> Self {
        Self {
            client,
            url: format!("{}/bridge", base_url.trim_end_matches('/')),
            origin: origin.into(),
        }
    }
}

#[async_trait]
impl PageChannel for HttpPageChannel {
    async fn post(&self, message: PageMessage) -> Result<Option<PageMessage>, BridgeError> {
        let response = self
            .client
            .post(&self.url)
            .header(header::ORIGIN, &self.origin)
            .json(&message)
            .send()
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        // rejected origins come back as 403 with an ERROR body
        let reply = response.json::<PageMessage>().await?;
        Ok(Some(reply))
    }
}

pub struct DashboardClient<C> {
    channel: C,
    ping_grace: Duration,
}

impl<C: PageChannel> DashboardClient<C> {
    pub fn new(channel: C, ping_grace: Duration) -> Self {
        Self { channel, ping_grace }
    }

    /// Existence check; `true` if a PONG arrived within the grace period
    pub async fn ping(&self) -> bool {
        matches!(
            tokio::time::timeout(self.ping_grace, self.channel.post(PageMessage::Ping)).await,
            Ok(Ok(Some(PageMessage::Pong)))
        )
    }

    /// Submit a batch and return the number of jobs the background queued
    pub async fn submit(&self, jobs: Vec<Job>, token: Option<String>) -> Result<usize, BridgeError> {
        if self.ping().await {
            debug!("bridge answered PONG");
        } else {
            debug!(grace = ?self.ping_grace, "no PONG within grace period; dispatching anyway");
        }

        match self.channel.post(PageMessage::StartScrape { jobs, token }).await? {
            Some(PageMessage::Ack { count }) => Ok(count),
            Some(PageMessage::Error { code, message }) => Err(BridgeError::Remote { code, message }),
            other => Err(BridgeError::UnexpectedReply(format!("{other:?}"))),
        }
    }
}

//! Content-script relay: the only path from a web page into the background.

use tracing::{debug, warn};

use super::background::BackgroundHandle;
use super::messages::{BridgeErrorCode, ExtensionMessage, PageMessage};
use super::origin::OriginPolicy;

/// What the relay does with an inbound page message
#[derive(Debug, Clone, PartialEq)]
pub enum RelayOutcome {
    /// Answer to post back to the page
    Reply(PageMessage),
    /// Origin failed the allow-list; nothing was forwarded
    Rejected(PageMessage),
    /// Not addressed to the relay (our own replies echoing back)
    Ignored,
}

pub struct ContentScriptRelay {
    policy: OriginPolicy,
    background: BackgroundHandle,
}

impl ContentScriptRelay {
    pub fn new(policy: OriginPolicy, background: BackgroundHandle) -> Self {
        Self { policy, background }
    }

    #[must_use]
    pub fn policy(&self) -> &OriginPolicy {
        &self.policy
    }

    /// Check the sender's origin, then answer or forward
    pub async fn handle(&self, origin: Option<&str>, message: PageMessage) -> RelayOutcome {
        let origin = origin.unwrap_or("null");
        if !self.policy.is_allowed(origin) {
            warn!(origin, "rejected bridge message from untrusted origin");
            return RelayOutcome::Rejected(PageMessage::error(
                BridgeErrorCode::OriginRejected,
                format!("origin {origin} is not allowed"),
            ));
        }

        match message {
            PageMessage::Ping => RelayOutcome::Reply(PageMessage::Pong),
            PageMessage::StartScrape { jobs, token } => {
                debug!(origin, jobs = jobs.len(), "forwarding scrape batch");
                let forwarded = self
                    .background
                    .send(ExtensionMessage::StartScrape { data: jobs, token })
                    .await;
                match forwarded {
                    Ok(ack) => RelayOutcome::Reply(PageMessage::Ack { count: ack.count }),
                    Err(e) => {
                        warn!(error = %e, "failed to reach background service");
                        RelayOutcome::Reply(PageMessage::error(e.code(), e.to_string()))
                    }
                }
            }
            PageMessage::Pong | PageMessage::Ack { .. } | PageMessage::Error { .. } => {
                RelayOutcome::Ignored
            }
        }
    }
}

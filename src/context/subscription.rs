//! Event subscriptions handed out by tab providers.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use super::provider::{TabEvent, TabId};

/// Receiving half of a provider's event stream
///
/// Dropping it is the unsubscribe; there is no separate removal call to
/// forget.
pub struct TabSubscription {
    rx: broadcast::Receiver<TabEvent>,
}

impl TabSubscription {
    #[must_use]
    pub fn new(rx: broadcast::Receiver<TabEvent>) -> Self {
        Self { rx }
    }

    /// Next event belonging to `tab`
    ///
    /// Events of other tabs are skipped. Returns `None` once the provider is
    /// gone.
    pub async fn recv_for(&mut self, tab: TabId) -> Option<TabEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.tab() == tab => return Some(event),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%tab, skipped, "tab event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Wait for the next `Loaded` event of `tab`
    pub async fn loaded(&mut self, tab: TabId) -> Option<()> {
        loop {
            match self.recv_for(tab).await? {
                TabEvent::Loaded { .. } => return Some(()),
                _ => continue,
            }
        }
    }
}

/// Fan-out hub providers publish through
#[derive(Debug, Clone)]
pub struct TabEventHub {
    tx: broadcast::Sender<TabEvent>,
}

impl TabEventHub {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    #[must_use]
    pub fn subscribe(&self) -> TabSubscription {
        TabSubscription::new(self.tx.subscribe())
    }

    /// Publish an event; having no subscribers is fine
    pub fn publish(&self, event: TabEvent) {
        let _ = self.tx.send(event);
    }

    /// Live subscriptions, used to verify listeners were released
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for TabEventHub {
    fn default() -> Self {
        Self::new(256)
    }
}

//! Cross-context messaging bridge.
//!
//! ```text
//! dashboard page ──PageMessage──▶ ContentScriptRelay ──ExtensionMessage──▶ BackgroundService
//!                ◀─PONG/ACK/ERROR─  (origin check)    ◀──────QueuedAck───── (freshness + queue)
//! ```

pub mod background;
pub mod client;
pub mod messages;
pub mod origin;
pub mod relay;
pub mod server;

use thiserror::Error;

pub use background::{BackgroundHandle, BackgroundService};
pub use client::{DashboardClient, HttpPageChannel, LocalPageChannel, PageChannel};
pub use messages::{AckStatus, BridgeErrorCode, ExtensionMessage, PageMessage, QueuedAck};
pub use origin::OriginPolicy;
pub use relay::{ContentScriptRelay, RelayOutcome};

/// Bridge-level failures
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("background service is not reachable")]
    Disconnected,

    #[error("bridge reported {code:?}: {message}")]
    Remote {
        code: BridgeErrorCode,
        message: String,
    },

    #[error("unexpected bridge reply: {0}")]
    UnexpectedReply(String),

    #[error("bridge transport failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl BridgeError {
    /// Code reported to the page for this failure
    #[must_use]
    pub fn code(&self) -> BridgeErrorCode {
        match self {
            Self::Remote { code, .. } => *code,
            Self::UnexpectedReply(_) => BridgeErrorCode::InvalidMessage,
            Self::Disconnected | Self::Transport(_) => BridgeErrorCode::ExtensionDisconnected,
        }
    }
}

//! Wire messages crossing the page / content script / background boundaries.

use serde::{Deserialize, Serialize};

use crate::jobs::Job;

/// Structured bridge error codes surfaced to the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BridgeErrorCode {
    ExtensionDisconnected,
    OriginRejected,
    InvalidMessage,
}

/// Messages between the dashboard page and the content-script relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageMessage {
    Ping,
    Pong,
    /// The dispatch step: a full batch plus the current auth token
    StartScrape {
        jobs: Vec<Job>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
    Ack {
        count: usize,
    },
    Error {
        code: BridgeErrorCode,
        message: String,
    },
}

impl PageMessage {
    pub fn error(code: BridgeErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }
}

/// Messages from the relay into the privileged background service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtensionMessage {
    StartScrape {
        data: Vec<Job>,
        #[serde(default)]
        token: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AckStatus {
    Queued,
}

/// Background acknowledgement: `{"status": "QUEUED", "count": n}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedAck {
    pub status: AckStatus,
    pub count: usize,
}

impl QueuedAck {
    #[must_use]
    pub fn queued(count: usize) -> Self {
        Self {
            status: AckStatus::Queued,
            count,
        }
    }
}

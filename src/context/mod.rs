//! Execution contexts: one isolated tab per job, never reused.

pub mod provider;
pub mod subscription;

pub use provider::{TabError, TabEvent, TabId, TabOptions, TabProvider};
pub use subscription::{TabEventHub, TabSubscription};

//! Result reporting.

pub mod http;

use async_trait::async_trait;

use crate::jobs::RateRecord;

pub use http::{Envelope, HttpReporter, IngestAck, ReportError};

/// Destination for a settled job's records
///
/// Best-effort: implementations log their own failures and never hand them
/// back to the queue.
#[async_trait]
pub trait RateSink: Send + Sync {
    async fn report(&self, records: Vec<RateRecord>, token: Option<&str>);
}

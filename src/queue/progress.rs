//! Progress reporting abstraction for the drain loop
//!
//! Defines the `ProgressReporter` trait for queue lifecycle events and
//! provides a no-op and a tracing-backed implementation.

use tracing::info;

use crate::jobs::{Job, JobResult};

/// Trait for reporting queue progress at key lifecycle events
///
/// Implementations can send updates to channels, log, or update a UI. Calls
/// happen on the drain task, in execution order.
pub trait ProgressReporter: Send + Sync {
    /// A batch was appended to the queue
    fn report_batch_queued(&self, count: usize, pending: usize);

    /// A job was popped and is about to execute
    fn report_job_started(&self, job: &Job);

    /// A job settled
    fn report_job_settled(&self, job: &Job, result: &JobResult);

    /// A job's execution panicked and was skipped
    fn report_job_crashed(&self, job: &Job);

    /// The queue ran empty and the drain loop stopped
    fn report_queue_drained(&self);
}

/// Progress reporter that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    #[inline(always)]
    fn report_batch_queued(&self, _count: usize, _pending: usize) {}

    #[inline(always)]
    fn report_job_started(&self, _job: &Job) {}

    #[inline(always)]
    fn report_job_settled(&self, _job: &Job, _result: &JobResult) {}

    #[inline(always)]
    fn report_job_crashed(&self, _job: &Job) {}

    #[inline(always)]
    fn report_queue_drained(&self) {}
}

/// Logs a one-line summary per event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn report_batch_queued(&self, count: usize, pending: usize) {
        info!(count, pending, "batch queued");
    }

    fn report_job_started(&self, job: &Job) {
        info!(competitor = %job.id, date = ?job.target_date(), "job started");
    }

    fn report_job_settled(&self, job: &Job, result: &JobResult) {
        match result {
            JobResult::Success(records) => {
                info!(competitor = %job.id, records = records.len(), "job succeeded");
            }
            JobResult::Failure(reason) => info!(competitor = %job.id, %reason, "job failed"),
        }
    }

    fn report_job_crashed(&self, job: &Job) {
        info!(competitor = %job.id, "job crashed");
    }

    fn report_queue_drained(&self) {
        info!("queue drained");
    }
}

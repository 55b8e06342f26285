//! Job execution: one tab, one adapter, one settled result.

pub mod job_executor;
pub mod lifecycle;

pub use job_executor::JobExecutor;
pub use lifecycle::{JobRun, JobState, Teardown};

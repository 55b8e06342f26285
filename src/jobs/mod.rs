//! Jobs, results and competitor helpers.

pub mod expand;
pub mod source;
pub mod types;

pub use expand::{Competitor, expand_competitor};
pub use source::CompetitorSource;
pub use types::{CompetitorId, FailureReason, Job, JobKind, JobResult, RateRecord};

//! Queue manager: serial FIFO execution with randomized spacing.

pub mod delay;
pub mod manager;
pub mod progress;
pub mod token_store;

pub use delay::DelayPolicy;
pub use manager::{QueueManager, QueueManagerBuilder, QueueState, Queued};
pub use progress::{NoOpProgress, ProgressReporter, TracingProgress};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};

//! Site adapters: per-site extraction scripts and their completion signal.

pub mod registry;
pub mod script;
pub mod signal;

pub use registry::{AdapterRegistry, SiteAdapter, SourceAdapter};
pub use script::{AdapterScript, SelectorSet, render_poll_script};
pub use signal::{AdapterPayload, AdapterRate, AdapterSignal};

//! Chromium-backed execution contexts.

pub mod setup;
pub mod tabs;

pub use setup::{find_browser_executable, launch_browser};
pub use tabs::ChromiumTabProvider;

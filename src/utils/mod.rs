pub mod constants;
pub mod url_utils;

pub use constants::*;
pub use url_utils::{check_in_from_url, extract_domain, is_valid_url, normalize_job_url};

//! URL helpers shared by job validation, adapter selection and freshness checks.

use chrono::NaiveDate;
use url::Url;

/// Query parameters OTAs use for the check-in date
const CHECK_IN_PARAMS: &[&str] = &[
    "checkin",
    "check_in",
    "checkIn",
    "checkin_date",
    "checkInDate",
    "startDate",
    "chkin",
];

/// Date layouts seen in check-in parameters: ISO, then MakeMyTrip's `MMDDYYYY`
const CHECK_IN_FORMATS: &[&str] = &["%Y-%m-%d", "%m%d%Y"];

/// Normalize a job URL for navigation
///
/// Trims whitespace and prefixes scheme-less URLs with `https://`.
/// Returns `None` for empty input or anything that still does not parse as an
/// http(s) URL afterwards.
#[must_use]
pub fn normalize_job_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed.trim_start_matches("//"))
    };

    match Url::parse(&candidate) {
        Ok(parsed) if is_valid_url(parsed.as_str()) && parsed.host_str().is_some() => {
            Some(parsed.into())
        }
        _ => None,
    }
}

/// Check if a URL is valid
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    // Skip data URLs, javascript URLs, and other non-http schemes
    if url.starts_with("data:") || url.starts_with("javascript:") || url.starts_with("mailto:") {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Lowercased host of a URL without a leading `www.`
#[must_use]
pub fn extract_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}

/// Parse a check-in date out of a target URL's query string
///
/// Accepts ISO dates (`2025-03-14`) and `MMDDYYYY` (`03142025`) under any of
/// the common OTA parameter names. Unparseable values are ignored.
#[must_use]
pub fn check_in_from_url(url: &str) -> Option<NaiveDate> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .filter(|(key, _)| CHECK_IN_PARAMS.contains(&key.as_ref()))
        .find_map(|(_, value)| {
            CHECK_IN_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(&value, format).ok())
        })
}

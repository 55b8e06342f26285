//! Expansion of a competitor into per-day scrape jobs.

use chrono::{Duration, NaiveDate};
use tracing::warn;

use super::source::CompetitorSource;
use super::types::{CompetitorId, Job};
use crate::utils::normalize_job_url;

/// A competitor as the dashboard knows it
#[derive(Debug, Clone)]
pub struct Competitor {
    pub id: CompetitorId,
    pub name: String,
    pub url: String,
}

/// Expand a competitor into one job per day starting at `start`
///
/// Each job's URL carries the site's own check-in/check-out parameters. A
/// competitor without a usable URL still yields jobs (with the raw URL) so the
/// executor can settle them as `MISSING_URL` instead of silently vanishing.
#[must_use]
pub fn expand_competitor(competitor: &Competitor, start: NaiveDate, days: u32) -> Vec<Job> {
    let normalized = normalize_job_url(&competitor.url);
    let source = normalized
        .as_deref()
        .map_or(CompetitorSource::Other, CompetitorSource::from_url);

    (0..days)
        .map(|offset| {
            let date = start + Duration::days(i64::from(offset));
            let url = match normalized.as_deref() {
                Some(url) => source.dated_url(url, date).unwrap_or_else(|e| {
                    warn!(competitor = %competitor.id, error = %e, "could not date competitor URL");
                    url.to_string()
                }),
                None => competitor.url.clone(),
            };
            Job::rate_scrape(competitor.id.clone(), competitor.name.clone(), url).with_check_in(date)
        })
        .collect()
}

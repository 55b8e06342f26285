//! Core data model: jobs, rate records and job results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::{DEFAULT_CURRENCY, DEFAULT_ROOM_TYPE, check_in_from_url};

/// Backend identifier of a competitor property
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompetitorId(String);

impl CompetitorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompetitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CompetitorId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Kind of work a job asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JobKind {
    #[default]
    #[serde(rename = "RATE_SCRAPE")]
    RateScrape,
}

/// One competitor/date scrape request
///
/// Jobs arrive from the dashboard already expanded per day and are never
/// mutated after they enter the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: CompetitorId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: JobKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_in_date: Option<NaiveDate>,
}

impl Job {
    pub fn rate_scrape(id: impl Into<CompetitorId>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            kind: JobKind::RateScrape,
            check_in_date: None,
        }
    }

    #[must_use]
    pub fn with_check_in(mut self, date: NaiveDate) -> Self {
        self.check_in_date = Some(date);
        self
    }

    /// Check-in date this job targets: explicit field first, then the URL query
    #[must_use]
    pub fn target_date(&self) -> Option<NaiveDate> {
        self.check_in_date.or_else(|| check_in_from_url(&self.url))
    }
}

/// One normalized rate observation, tagged with the competitor it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub competitor_id: CompetitorId,
    pub check_in_date: NaiveDate,
    pub price: f64,
    #[serde(default = "default_room_type")]
    pub room_type: String,
    #[serde(default)]
    pub is_sold_out: bool,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub source_url: String,
}

fn default_room_type() -> String {
    DEFAULT_ROOM_TYPE.to_string()
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

/// Why a job produced no records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    Timeout,
    InjectionFailed,
    MissingUrl,
    TabFailed,
    /// The adapter ran but reported an error instead of data
    AdapterError,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Timeout => "TIMEOUT",
            Self::InjectionFailed => "INJECTION_FAILED",
            Self::MissingUrl => "MISSING_URL",
            Self::TabFailed => "TAB_FAILED",
            Self::AdapterError => "ADAPTER_ERROR",
        };
        f.write_str(name)
    }
}

/// Settled outcome of one job; produced exactly once per execution
#[derive(Debug, Clone, PartialEq)]
pub enum JobResult {
    Success(Vec<RateRecord>),
    Failure(FailureReason),
}

impl JobResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    #[must_use]
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            Self::Success(_) => None,
            Self::Failure(reason) => Some(*reason),
        }
    }
}

//! Completion signal emitted by an adapter running inside a page.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Raw message an adapter posts through the page binding
///
/// `{ "success": true, "data": {...} }` or `{ "success": false, "error": "..." }`.
/// `data` may be a single rate or a list of rates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AdapterSignal {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<AdapterPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdapterPayload {
    Many(Vec<AdapterRate>),
    One(AdapterRate),
}

/// One extracted rate, before it is tagged with the job's competitor
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AdapterRate {
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub room_type: Option<String>,
    #[serde(default)]
    pub is_sold_out: bool,
    #[serde(default)]
    pub check_in_date: Option<NaiveDate>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl AdapterSignal {
    /// Successful single-rate signal
    #[must_use]
    pub fn rate(price: f64, room_type: impl Into<String>, is_sold_out: bool) -> Self {
        Self {
            success: true,
            data: Some(AdapterPayload::One(AdapterRate {
                price: Some(price),
                room_type: Some(room_type.into()),
                is_sold_out,
                ..AdapterRate::default()
            })),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Parse the JSON string an adapter passed to the binding
    pub fn from_payload(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// Rates carried by a successful signal; empty for failures
    #[must_use]
    pub fn into_rates(self) -> Vec<AdapterRate> {
        if !self.success {
            return Vec::new();
        }
        match self.data {
            Some(AdapterPayload::Many(rates)) => rates,
            Some(AdapterPayload::One(rate)) => vec![rate],
            None => Vec::new(),
        }
    }
}

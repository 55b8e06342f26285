//! Result delivery to the backend ingestion endpoint.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::RateSink;
use crate::freshness::FreshnessStore;
use crate::jobs::RateRecord;
use crate::utils::RATES_ENVELOPE_FIELD;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Report delivery failures. Logged by the sink, never retried.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} answered {status}: {body}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// How the record array is wrapped in the request body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// `{ "<field>": [...] }`
    Named(String),
    /// `[...]`
    Bare,
}

impl Default for Envelope {
    fn default() -> Self {
        Self::Named(RATES_ENVELOPE_FIELD.to_string())
    }
}

impl From<Option<&str>> for Envelope {
    fn from(field: Option<&str>) -> Self {
        field.map_or(Self::Bare, |f| Self::Named(f.to_string()))
    }
}

/// Backend acknowledgement, e.g. `{"message": "Successfully ingested 3 rates", "status": "success"}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestAck {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// POSTs each settled job's records as one JSON request
pub struct HttpReporter {
    client: Client,
    endpoint: String,
    envelope: Envelope,
    freshness: Option<Arc<dyn FreshnessStore>>,
}

impl HttpReporter {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ReportError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ReportError::Client)?;
        Ok(Self::with_client(client, endpoint))
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            envelope: Envelope::default(),
            freshness: None,
        }
    }

    #[must_use]
    pub fn envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = envelope;
        self
    }

    /// Stamp fetch times into `store` for every accepted record
    #[must_use]
    pub fn record_freshness(mut self, store: Arc<dyn FreshnessStore>) -> Self {
        self.freshness = Some(store);
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Request body for `records` under the configured envelope
    #[must_use]
    pub fn body(&self, records: &[RateRecord]) -> Value {
        let rates = json!(records);
        match &self.envelope {
            Envelope::Named(field) => {
                let mut body = serde_json::Map::new();
                body.insert(field.clone(), rates);
                Value::Object(body)
            }
            Envelope::Bare => rates,
        }
    }

    /// Send one batch; bearer auth is attached when a token is held
    pub async fn post(&self, records: &[RateRecord], token: Option<&str>) -> Result<IngestAck, ReportError> {
        let mut request = self.client.post(&self.endpoint).json(&self.body(records));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|source| ReportError::Http {
            endpoint: self.endpoint.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReportError::Status {
                endpoint: self.endpoint.clone(),
                status,
                body,
            });
        }

        // a 2xx with an unexpected body still counts as delivered
        let ack = response.json::<IngestAck>().await.unwrap_or_else(|e| {
            debug!(error = %e, "ingest response was not the expected JSON");
            IngestAck::default()
        });

        if let Some(store) = &self.freshness {
            let fetched: Vec<_> = records
                .iter()
                .map(|r| (r.competitor_id.clone(), r.check_in_date))
                .collect();
            store.record_fetches(&fetched, Utc::now()).await;
        }
        Ok(ack)
    }
}

#[async_trait]
impl RateSink for HttpReporter {
    async fn report(&self, records: Vec<RateRecord>, token: Option<&str>) {
        let count = records.len();
        match self.post(&records, token).await {
            Ok(ack) => info!(
                count,
                message = ack.message.as_deref().unwrap_or(""),
                "reported rates"
            ),
            Err(e) => warn!(count, error = %e, "rate report dropped"),
        }
    }
}

//! URL-pattern → site adapter registry.

use std::sync::Arc;
use tracing::debug;
use url::Url;

use super::script::{AdapterScript, SelectorSet, render_poll_script};
use crate::config::AdapterTuning;
use crate::jobs::CompetitorSource;

/// Pluggable per-site extraction capability
pub trait SiteAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this adapter understands pages at `url`
    fn detect(&self, url: &Url) -> bool;

    fn script(&self) -> &AdapterScript;
}

/// Adapter matched by host markers of a competitor source
pub struct SourceAdapter {
    source: CompetitorSource,
    script: AdapterScript,
}

impl SourceAdapter {
    pub fn new(source: CompetitorSource, tuning: AdapterTuning) -> Result<Self, serde_json::Error> {
        let script = render_poll_script(source.label(), selectors_for(source), tuning)?;
        Ok(Self { source, script })
    }

    #[must_use]
    pub fn source(&self) -> CompetitorSource {
        self.source
    }
}

impl SiteAdapter for SourceAdapter {
    fn name(&self) -> &str {
        self.source.label()
    }

    fn detect(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.source.host_markers().iter().any(|m| host.contains(m))
    }

    fn script(&self) -> &AdapterScript {
        &self.script
    }
}

fn selectors_for(source: CompetitorSource) -> SelectorSet {
    match source {
        CompetitorSource::Booking => SelectorSet {
            price: &[
                "[data-testid=\"price-and-discounted-price\"]",
                ".prco-valign-middle-helper",
                ".bui-price-display__value",
            ],
            room: &[".hprt-roomtype-icon-link", "[data-testid=\"title\"]"],
        },
        CompetitorSource::Agoda => SelectorSet {
            price: &[
                "[data-selenium=\"display-price\"]",
                ".PropertyCardPrice__Value",
                ".pd-price",
            ],
            room: &["[data-selenium=\"masterroom-title-name\"]", ".MasterRoom__HotelName"],
        },
        CompetitorSource::Expedia => SelectorSet {
            price: &[
                "[data-stid=\"price-summary\"] .uitk-type-500",
                "[data-test-id=\"price-summary-message-line\"]",
            ],
            room: &["[data-stid=\"property-offer-header\"] h3", ".uitk-card h3"],
        },
        CompetitorSource::MakeMyTrip => SelectorSet {
            price: &["#hlistpg_hotel_shown_price", ".latoBlack.font26", ".prcCont .latoBlack"],
            room: &[".rmTypeName", ".roomName"],
        },
        CompetitorSource::Other => SelectorSet {
            price: &["[itemprop=\"price\"]", "[class*=\"price\" i]", "[data-price]"],
            room: &["[class*=\"room-name\" i]", "[class*=\"roomtype\" i]", "h2"],
        },
    }
}

/// Ordered adapter list with a generic fallback
///
/// Resolution walks the registered adapters in insertion order and returns
/// the first whose `detect` accepts the URL.
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn SiteAdapter>>,
    fallback: Arc<dyn SiteAdapter>,
}

impl AdapterRegistry {
    pub fn new(fallback: Arc<dyn SiteAdapter>) -> Self {
        Self {
            adapters: Vec::new(),
            fallback,
        }
    }

    /// Registry with one adapter per known OTA and the generic fallback
    pub fn builtin(tuning: AdapterTuning) -> Result<Self, serde_json::Error> {
        let mut registry = Self::new(Arc::new(SourceAdapter::new(CompetitorSource::Other, tuning)?));
        for source in CompetitorSource::KNOWN {
            registry.register(Arc::new(SourceAdapter::new(source, tuning)?));
        }
        Ok(registry)
    }

    pub fn register(&mut self, adapter: Arc<dyn SiteAdapter>) {
        self.adapters.push(adapter);
    }

    /// Pick the adapter for `url`, falling back when nothing matches
    #[must_use]
    pub fn resolve(&self, url: &str) -> Arc<dyn SiteAdapter> {
        let adapter = Url::parse(url)
            .ok()
            .and_then(|parsed| self.adapters.iter().find(|a| a.detect(&parsed)).cloned())
            .unwrap_or_else(|| Arc::clone(&self.fallback));
        debug!(url, adapter = adapter.name(), "resolved site adapter");
        adapter
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

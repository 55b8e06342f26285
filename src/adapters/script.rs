//! Rendering of adapter scripts from the shared poll-loop template.

use serde::Serialize;
use std::sync::Arc;

use crate::config::AdapterTuning;
use crate::utils::ADAPTER_BINDING;

const POLL_TEMPLATE: &str = include_str!("poll_adapter.js");

/// Lowercase phrases that mean "no rooms for these dates" on common OTAs
pub const SOLD_OUT_PHRASES: &[&str] = &[
    "sold out",
    "no rooms available",
    "not available for your dates",
    "no availability",
    "we have no availability",
    "fully booked",
];

/// Ready-to-evaluate adapter source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterScript {
    name: Arc<str>,
    source: Arc<str>,
}

impl AdapterScript {
    pub fn new(name: impl Into<Arc<str>>, source: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateConfig<'a> {
    binding: &'a str,
    site: &'a str,
    poll_interval_ms: u64,
    max_attempts: u32,
    confirm_delay_ms: u64,
    price_selectors: &'a [&'a str],
    room_selectors: &'a [&'a str],
    sold_out_phrases: &'a [&'a str],
}

/// Selector lists a site adapter feeds into the template
#[derive(Debug, Clone, Copy)]
pub struct SelectorSet {
    pub price: &'static [&'static str],
    pub room: &'static [&'static str],
}

/// Render the poll-loop template for one site
pub fn render_poll_script(
    site: &str,
    selectors: SelectorSet,
    tuning: AdapterTuning,
) -> Result<AdapterScript, serde_json::Error> {
    let cfg = serde_json::to_string(&TemplateConfig {
        binding: ADAPTER_BINDING,
        site,
        poll_interval_ms: tuning.poll_interval_ms,
        max_attempts: tuning.max_attempts,
        confirm_delay_ms: tuning.sold_out_confirm_ms,
        price_selectors: selectors.price,
        room_selectors: selectors.room,
        sold_out_phrases: SOLD_OUT_PHRASES,
    })?;

    // block scope keeps `cfg` from leaking into the page's globals
    let source = format!("{{\nconst cfg = {cfg};\n{POLL_TEMPLATE}\n}}");
    Ok(AdapterScript::new(site, source))
}

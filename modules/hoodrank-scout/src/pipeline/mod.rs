//! Multi-strategy extraction pipeline.
//!
//! Strategies run in a fixed priority order and the first one that yields at
//! least one record wins. Static strategies only need page text; the driven
//! sweep needs a live [`DomDriver`]. If everything comes up empty the fixed
//! fallback dataset is returned, so an [`Extraction`] is never empty.

pub mod embedded;
pub mod fallback;
pub mod field_tuple;
pub mod inline_attr;

use std::fmt;

use tracing::{info, warn};

use hoodrank_common::{Record, RecordSet};

use crate::driver::DomDriver;
use crate::sweep::{DrivenSweep, SweepConfig};

use embedded::EmbeddedObjectExtractor;
use inline_attr::InlineAttributeExtractor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    EmbeddedObject,
    InlineAttribute,
    FieldTuple,
    DrivenAutomation,
    Fallback,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::EmbeddedObject => "embedded_object",
            Strategy::InlineAttribute => "inline_attribute",
            Strategy::FieldTuple => "field_tuple",
            Strategy::DrivenAutomation => "driven_automation",
            Strategy::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the pipeline gets to look at. Either part may be absent.
#[derive(Clone, Copy, Default)]
pub struct ExtractionInput<'a> {
    pub html: Option<&'a str>,
    pub driver: Option<&'a dyn DomDriver>,
}

impl<'a> ExtractionInput<'a> {
    pub fn html(html: &'a str) -> Self {
        Self {
            html: Some(html),
            driver: None,
        }
    }

    pub fn driven(html: Option<&'a str>, driver: &'a dyn DomDriver) -> Self {
        Self {
            html,
            driver: Some(driver),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub records: Vec<Record>,
    pub strategy: Strategy,
}

impl Extraction {
    pub fn used_fallback(&self) -> bool {
        self.strategy == Strategy::Fallback
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Name of the script constant holding the rankings object.
    pub embedded_marker: String,
    /// Top-level key of the region to read from that object.
    pub region_key: String,
    /// Click handler whose arguments carry a record.
    pub inline_handler: String,
    pub driven: SweepConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            embedded_marker: "rankings".into(),
            region_key: "ny".into(),
            inline_handler: "flyToLocation".into(),
            driven: SweepConfig::default(),
        }
    }
}

pub struct ExtractionPipeline {
    config: PipelineConfig,
    embedded: EmbeddedObjectExtractor,
    inline: InlineAttributeExtractor,
}

impl Default for ExtractionPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl ExtractionPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let embedded = EmbeddedObjectExtractor::new(&config.embedded_marker, &config.region_key);
        let inline = InlineAttributeExtractor::new(&config.inline_handler);
        Self {
            config,
            embedded,
            inline,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the strategies in order and return the first non-empty result.
    pub async fn run(&self, input: ExtractionInput<'_>) -> Extraction {
        if let Some(extraction) = input.html.and_then(|html| self.extract_static(html)) {
            return extraction;
        }

        if let Some(driver) = input.driver {
            let found = DrivenSweep::new(&self.config.driven, driver).run().await;
            if let Some(extraction) = finish(Strategy::DrivenAutomation, found) {
                return extraction;
            }
        }

        warn!("No strategy produced records, using fallback dataset");
        Extraction {
            records: fallback::records(),
            strategy: Strategy::Fallback,
        }
    }

    /// Static strategies only (embedded object, click handlers, field tuples).
    pub fn extract_static(&self, html: &str) -> Option<Extraction> {
        finish(Strategy::EmbeddedObject, self.embedded.extract(html))
            .or_else(|| finish(Strategy::InlineAttribute, self.inline.extract(html)))
            .or_else(|| finish(Strategy::FieldTuple, field_tuple::extract(html)))
    }
}

fn finish(strategy: Strategy, found: RecordSet) -> Option<Extraction> {
    if found.is_empty() {
        return None;
    }
    info!(strategy = %strategy, records = found.len(), "Extraction strategy produced records");
    Some(Extraction {
        records: found.into_records(),
        strategy,
    })
}

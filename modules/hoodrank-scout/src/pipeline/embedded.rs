use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};

use hoodrank_common::{Record, RecordSet};

/// Reads the rankings object a page script assigns to a named constant:
/// `const rankings = { "<region>": { "<metric>": { "<position>": [ {...}, ... ] } } }`.
///
/// Only the first assignment in the text is considered. Every entry across
/// every metric and position becomes a candidate; the first occurrence of a
/// name wins.
pub struct EmbeddedObjectExtractor {
    assignment: Regex,
    region_key: String,
}

impl EmbeddedObjectExtractor {
    pub fn new(marker: &str, region_key: &str) -> Self {
        let pattern = format!(
            r"(?s)(?:const|let|var)\s+{}\s*=\s*(\{{.*?\}});",
            regex::escape(marker)
        );
        Self {
            assignment: Regex::new(&pattern).expect("escaped marker forms a valid regex"),
            region_key: region_key.to_string(),
        }
    }

    pub fn extract(&self, text: &str) -> RecordSet {
        let mut found = RecordSet::new();

        let Some(caps) = self.assignment.captures(text) else {
            debug!("No embedded rankings object in page");
            return found;
        };

        let data: Value = match serde_json::from_str(&caps[1]) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Found embedded rankings object but couldn't parse it");
                return found;
            }
        };

        let Some(region) = data.get(&self.region_key).and_then(Value::as_object) else {
            warn!(region = self.region_key.as_str(), "Embedded rankings have no entry for region");
            return found;
        };

        for (metric, positions) in region {
            let Some(positions) = positions.as_object() else {
                debug!(metric = metric.as_str(), "Skipping metric that isn't an object");
                continue;
            };
            for entries in positions.values().filter_map(Value::as_array) {
                for entry in entries {
                    match entry.as_object().and_then(Record::from_json_object) {
                        Some(record) => {
                            found.insert(record);
                        }
                        None => debug!(metric = metric.as_str(), "Skipping entry without a name"),
                    }
                }
            }
        }

        info!(records = found.len(), "Extracted records from embedded rankings");
        found
    }
}

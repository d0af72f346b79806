use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use hoodrank_common::{clean_text, Record, RecordSet};

static ONCLICK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[onclick]").expect("valid selector"));
static RESULT_NAME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".result-name").expect("valid selector"));
static RESULT_HOOD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".result-hood").expect("valid selector"));

#[derive(Debug, Error)]
enum HandlerError {
    #[error("handler call not recognised")]
    NoCall,
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is not an object")]
    NotAnObject,
    #[error("no restaurant name in payload or markup")]
    NoName,
}

/// Reads records out of click handlers shaped like
/// `<handler>(<lng>, <lat>, {...json...})`.
///
/// The coordinates from the call arguments override any in the payload. When
/// the payload has no name or hood, the text of a `.result-name` /
/// `.result-hood` element inside the clickable element (or, failing that,
/// inside its parent) fills the gap.
pub struct InlineAttributeExtractor {
    call_prefix: String,
    call: Regex,
}

impl InlineAttributeExtractor {
    pub fn new(handler: &str) -> Self {
        let pattern = format!(
            r"(?s){}\(\s*([^,]+?)\s*,\s*([^,]+?)\s*,\s*(\{{.+?\}})\s*\)",
            regex::escape(handler)
        );
        Self {
            call_prefix: format!("{handler}("),
            call: Regex::new(&pattern).expect("escaped handler forms a valid regex"),
        }
    }

    pub fn extract(&self, html: &str) -> RecordSet {
        let document = Html::parse_document(html);
        let mut found = RecordSet::new();
        let mut candidates = 0usize;

        for element in document.select(&ONCLICK) {
            let Some(onclick) = element.value().attr("onclick") else {
                continue;
            };
            if !onclick.contains(&self.call_prefix) {
                continue;
            }
            candidates += 1;

            match self.parse_element(element, onclick) {
                Ok(record) => {
                    if !found.insert(record) {
                        debug!("Duplicate name in click handler, keeping first");
                    }
                }
                Err(e) => {
                    let snippet: String = onclick.chars().take(80).collect();
                    warn!(error = %e, onclick = snippet.as_str(), "Skipping click handler");
                }
            }
        }

        if candidates > 0 {
            info!(candidates, records = found.len(), "Extracted records from click handlers");
        }
        found
    }

    fn parse_element(&self, element: ElementRef<'_>, onclick: &str) -> Result<Record, HandlerError> {
        let caps = self.call.captures(onclick).ok_or(HandlerError::NoCall)?;

        // Some pages double-escape the payload quotes.
        let payload = caps[3].replace("&quot;", "\"");
        let mut data: Map<String, Value> = match serde_json::from_str(&payload)? {
            Value::Object(map) => map,
            _ => return Err(HandlerError::NotAnObject),
        };

        let lng = caps[1].trim().parse::<f64>();
        let lat = caps[2].trim().parse::<f64>();
        if let (Ok(lng), Ok(lat)) = (lng, lat) {
            data.insert("long".into(), json!(lng));
            data.insert("lat".into(), json!(lat));
        }

        fill_from_markup(&mut data, "name", element, &RESULT_NAME);
        fill_from_markup(&mut data, "hood", element, &RESULT_HOOD);

        Record::from_json_object(&data).ok_or(HandlerError::NoName)
    }
}

fn fill_from_markup(data: &mut Map<String, Value>, key: &str, element: ElementRef<'_>, selector: &Selector) {
    let present = data
        .get(key)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty());
    if present {
        return;
    }
    if let Some(text) = markup_text(element, selector) {
        data.insert(key.to_string(), Value::String(text));
    }
}

fn markup_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    let own = element.select(selector).next();
    let sibling = || {
        element
            .parent()
            .and_then(ElementRef::wrap)
            .and_then(|parent| parent.select(selector).next())
    };
    own.or_else(sibling)
        .map(|el| clean_text(&el.text().collect::<String>()))
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoodrank_common::RawScore;

    fn extractor() -> InlineAttributeExtractor {
        InlineAttributeExtractor::new("flyToLocation")
    }

    #[test]
    fn reads_payload_and_coordinates() {
        let html = r#"<div class="result-item"
            onclick='flyToLocation(-73.99, 40.72, {"name": "Balthazar", "hood": "SoHo", "attractive_score": "8.4"})'>
            </div>"#;

        let records = extractor().extract(html).into_records();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.name, "Balthazar");
        assert_eq!(r.hood.as_deref(), Some("SoHo"));
        assert_eq!(r.long, Some(-73.99));
        assert_eq!(r.lat, Some(40.72));
        assert_eq!(r.attractive_score, Some(RawScore::Text("8.4".into())));
    }

    #[test]
    fn entity_escaped_payload_is_decoded() {
        let html = r#"<li onclick="flyToLocation(-74.0, 40.7, {&quot;name&quot;: &quot;Lilia&quot;})"></li>"#;
        let records = extractor().extract(html).into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Lilia");
    }

    #[test]
    fn name_and_hood_fall_back_to_markup() {
        let html = r#"
            <div class="result-item" onclick='flyToLocation(-73.98, 40.76, {"cuisine": "Thai"})'>
              <span class="result-name"> Wayla </span>
            </div>
            <div class="row">
              <a onclick='flyToLocation(-73.95, 40.77, {"name": "JG Melon"})'>go</a>
              <span class="result-hood">Upper East Side</span>
            </div>"#;

        let records = extractor().extract(html).into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Wayla");
        assert_eq!(records[0].cuisine.as_deref(), Some("Thai"));
        assert_eq!(records[1].hood.as_deref(), Some("Upper East Side"));
    }

    #[test]
    fn bad_payload_is_skipped_not_fatal() {
        let html = r#"
            <div onclick='flyToLocation(-73.9, 40.7, {not json})'></div>
            <div onclick='flyToLocation(-73.9, 40.7, {"hood": "Tribeca"})'></div>
            <div onclick='flyToLocation(-73.9, 40.7, {"name": "Frenchette"})'></div>"#;

        let records = extractor().extract(html).into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Frenchette");
    }

    #[test]
    fn unrelated_handlers_are_ignored() {
        let html = r#"<button onclick="toggleMenu()">menu</button>"#;
        assert!(extractor().extract(html).is_empty());
    }

    #[test]
    fn non_numeric_arguments_keep_payload_coordinates() {
        let html = r#"<div onclick='flyToLocation(pos.lng, pos.lat, {"name": "Odo", "lat": 40.74, "lng": -73.99})'></div>"#;
        let records = extractor().extract(html).into_records();
        assert_eq!(records[0].lat, Some(40.74));
        assert_eq!(records[0].long, Some(-73.99));
    }
}

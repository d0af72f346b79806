use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Neighborhood reported for records that never resolved one.
pub const UNKNOWN_NEIGHBORHOOD: &str = "Unknown";

// ---------------------------------------------------------------------------
// RawScore
// ---------------------------------------------------------------------------

/// A demographic score exactly as it was scraped.
///
/// Embedded JSON and regex matches deliver scores as text (`"8.5"`), popups
/// deliver computed numbers. Keeping the raw form lets the record round-trip
/// through the JSON sink unchanged; numeric coercion happens only when the
/// aggregator asks for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawScore {
    Number(f64),
    Text(String),
}

impl RawScore {
    /// Interpret a JSON value as a score. Objects, arrays, booleans and null
    /// are not scores.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(RawScore::Number),
            Value::String(s) => Some(RawScore::Text(s.trim().to_string())),
            _ => None,
        }
    }

    /// Numeric value on the nominal 0–10 scale. Unparseable text and
    /// non-finite numbers coerce to `0.0`.
    pub fn coerce(&self) -> f64 {
        match self {
            RawScore::Number(n) if n.is_finite() => *n,
            RawScore::Number(n) => {
                warn!(value = %n, "Non-finite score, using 0.0");
                0.0
            }
            RawScore::Text(text) => match text.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => v,
                _ => {
                    warn!(value = text.as_str(), "Could not convert score to float, using 0.0");
                    0.0
                }
            },
        }
    }
}

impl From<f64> for RawScore {
    fn from(value: f64) -> Self {
        RawScore::Number(value)
    }
}

impl From<&str> for RawScore {
    fn from(value: &str) -> Self {
        RawScore::Text(value.to_string())
    }
}

impl fmt::Display for RawScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawScore::Number(n) => write!(f, "{n}"),
            RawScore::Text(t) => f.write_str(t),
        }
    }
}

/// Coerce an optional score; a missing score counts as `0.0`.
pub fn coerce_score(score: Option<&RawScore>) -> f64 {
    score.map(RawScore::coerce).unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One scraped restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "loose_score")]
    pub attractive_score: Option<RawScore>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "loose_score")]
    pub age_score: Option<RawScore>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "loose_score")]
    pub gender_score: Option<RawScore>,
    /// Overall rating text, e.g. `"8.5"` from a `8.5/10` badge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
    /// Review-count text, e.g. `"150 reviewers"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "loose_number")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "loose_number")]
    pub long: Option<f64>,
}

impl Record {
    /// Create a record with only a name. Blank names are rejected.
    pub fn new(name: &str) -> Option<Self> {
        let name = clean_text(name);
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name,
            hood: None,
            cuisine: None,
            attractive_score: None,
            age_score: None,
            gender_score: None,
            score: None,
            reviewers: None,
            lat: None,
            long: None,
        })
    }

    /// Build a record from a loosely-typed JSON object as found in page
    /// scripts and click handlers. Unknown keys are ignored; strings and
    /// numbers are both accepted for text, score and coordinate fields.
    pub fn from_json_object(obj: &Map<String, Value>) -> Option<Self> {
        let mut record = Self::new(&text_field(obj, "name")?)?;
        record.hood = non_empty(text_field(obj, "hood"));
        record.cuisine = non_empty(text_field(obj, "cuisine"));
        record.score = non_empty(text_field(obj, "score"));
        record.reviewers = non_empty(text_field(obj, "reviewers"));
        record.attractive_score = obj.get("attractive_score").and_then(RawScore::from_json);
        record.age_score = obj.get("age_score").and_then(RawScore::from_json);
        record.gender_score = obj.get("gender_score").and_then(RawScore::from_json);
        record.lat = ["lat", "latitude"]
            .iter()
            .find_map(|key| number_field(obj, key));
        record.long = ["long", "longitude", "lng"]
            .iter()
            .find_map(|key| number_field(obj, key));
        Some(record)
    }

    /// Neighborhood, or [`UNKNOWN_NEIGHBORHOOD`] when none was resolved.
    pub fn neighborhood(&self) -> &str {
        self.hood.as_deref().unwrap_or(UNKNOWN_NEIGHBORHOOD)
    }

    /// Key used for duplicate detection: names compare case-insensitively.
    pub fn dedup_key(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn attractive(&self) -> f64 {
        coerce_score(self.attractive_score.as_ref())
    }

    pub fn age(&self) -> f64 {
        coerce_score(self.age_score.as_ref())
    }

    pub fn gender(&self) -> f64 {
        coerce_score(self.gender_score.as_ref())
    }
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(clean_text(s)),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_field(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    value_as_f64(obj.get(key)?)
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// A malformed score or coordinate never fails the load. Non-scalar scores keep
// their JSON text and coerce to 0.0 like any other unparseable score.
fn loose_score<'de, D>(deserializer: D) -> Result<Option<RawScore>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(value @ (Value::Bool(_) | Value::Array(_) | Value::Object(_))) => {
            Some(RawScore::Text(value.to_string()))
        }
        Some(scalar) => RawScore::from_json(&scalar),
    })
}

fn loose_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(value_as_f64))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Trim and collapse internal whitespace runs to a single space.
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// RecordSet
// ---------------------------------------------------------------------------

/// Accumulator that enforces unique case-insensitive names, first-seen-wins.
///
/// Every extraction step receives the same set and only ever appends to it,
/// so ordering is discovery order.
#[derive(Debug, Default, Clone)]
pub struct RecordSet {
    seen: HashSet<String>,
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `record` unless a record with the same name was seen.
    /// Returns `true` if it was added.
    pub fn insert(&mut self, record: Record) -> bool {
        if !self.seen.insert(record.dedup_key()) {
            return false;
        }
        self.records.push(record);
        true
    }

    /// Insert every record, returning how many were new.
    pub fn extend(&mut self, records: impl IntoIterator<Item = Record>) -> usize {
        let mut added = 0;
        for record in records {
            if self.insert(record) {
                added += 1;
            }
        }
        added
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.seen.contains(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

/// Drop later duplicates from an already-built list.
pub fn dedup_records(records: Vec<Record>) -> Vec<Record> {
    let mut set = RecordSet::new();
    for record in records {
        set.insert(record);
    }
    set.into_records()
}

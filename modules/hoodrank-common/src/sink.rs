//! File sinks for scraped records and derived tables.
//!
//! JSON is the canonical format (and the one `analyze` reads back). CSV is a
//! generic array-of-objects conversion: any serializable row type works, the
//! header is the union of keys in first-seen order.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use indexmap::IndexSet;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::{HoodrankError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

fn create(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

/// Write rows as a pretty-printed JSON array (2-space indent, UTF-8 kept as is).
pub fn write_json<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = BufWriter::new(create(path)?);
    serde_json::to_writer_pretty(&mut writer, rows)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    info!(path = %path.display(), rows = rows.len(), "Wrote JSON");
    Ok(())
}

/// Read a JSON array written by [`write_json`].
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let reader = BufReader::new(File::open(path)?);
    let rows: Vec<T> = serde_json::from_reader(reader)?;
    info!(path = %path.display(), rows = rows.len(), "Loaded JSON");
    Ok(rows)
}

/// Write rows as CSV. Each row must serialize to a JSON object.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let objects = rows
        .iter()
        .map(|row| match serde_json::to_value(row)? {
            Value::Object(map) => Ok(map),
            other => Err(HoodrankError::Shape(type_name(&other).to_string())),
        })
        .collect::<Result<Vec<_>>>()?;

    let mut header: IndexSet<&str> = IndexSet::new();
    for obj in &objects {
        header.extend(obj.keys().map(String::as_str));
    }

    let mut writer = csv::Writer::from_writer(create(path)?);
    if !header.is_empty() {
        writer.write_record(header.iter())?;
    }
    for obj in &objects {
        writer.write_record(header.iter().map(|key| cell(obj.get(*key))))?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = rows.len(), columns = header.len(), "Wrote CSV");
    Ok(())
}

pub fn write_rows<T: Serialize>(path: &Path, format: OutputFormat, rows: &[T]) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(path, rows),
        OutputFormat::Csv => write_csv(path, rows),
    }
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RawScore, Record};

    fn sample() -> Vec<Record> {
        let mut a = Record::new("Café Habana").unwrap();
        a.hood = Some("Nolita".into());
        a.attractive_score = Some(RawScore::from("8"));
        a.lat = Some(40.7228);
        a.long = Some(-73.9945);

        let mut b = Record::new("Katz's").unwrap();
        b.hood = Some("Lower East Side".into());
        b.age_score = Some(RawScore::Number(6.5));
        b.cuisine = Some("Deli".into());

        vec![a, b]
    }

    // --- JSON ---

    #[test]
    fn json_round_trip_is_field_for_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("records.json");
        let records = sample();

        write_json(&path, &records).unwrap();
        let back: Vec<Record> = read_json(&path).unwrap();

        assert_eq!(back, records);
    }

    #[test]
    fn json_keeps_non_ascii_and_two_space_indent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        write_json(&path, &sample()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("Café Habana"));
        assert!(text.contains("\n  {\n    \"name\""));
        assert!(!text.contains("\"cuisine\": null"), "absent fields are omitted");
    }

    #[test]
    fn malformed_scores_do_not_fail_the_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        fs::write(
            &path,
            r#"[{"name":"A","hood":"SoHo","attractive_score":"8"},
                {"name":"B","hood":"SoHo","attractive_score":true,"lat":"40.7"}]"#,
        )
        .unwrap();

        let records: Vec<Record> = read_json(&path).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].attractive(), 8.0);
        assert_eq!(records[1].attractive(), 0.0);
        assert_eq!(records[1].lat, Some(40.7));
    }

    #[test]
    fn reading_missing_file_is_io_error() {
        let err = read_json::<Record>(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, HoodrankError::Io(_)));
    }

    // --- CSV ---

    #[test]
    fn csv_header_is_union_of_keys_in_first_seen_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.csv");
        write_csv(&path, &sample()).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(
            header,
            vec!["name", "hood", "attractive_score", "lat", "long", "cuisine", "age_score"]
        );

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "Café Habana");
        assert_eq!(&rows[0][2], "8");
        assert_eq!(&rows[0][5], "", "missing cell is empty");
        assert_eq!(&rows[1][6], "6.5");
    }

    #[test]
    fn csv_rejects_non_object_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        let err = write_csv(&path, &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, HoodrankError::Shape(ref t) if t == "number"));
    }
}

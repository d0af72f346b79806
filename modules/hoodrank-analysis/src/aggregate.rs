use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use hoodrank_common::Record;

use crate::allow_list::is_manhattan;

/// Per-neighborhood averages over the allow-listed records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodStat {
    pub neighborhood: String,
    pub restaurant_count: usize,
    pub avg_attractive: f64,
    pub avg_age: f64,
    pub avg_gender: f64,
    pub median_attractive: f64,
    /// Sample standard deviation; `0.0` for a single restaurant.
    pub std_attractive: f64,
}

impl NeighborhoodStat {
    fn from_group(neighborhood: &str, records: &[&Record]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        let attractive: Vec<f64> = records.iter().map(|r| r.attractive()).collect();
        let age: Vec<f64> = records.iter().map(|r| r.age()).collect();
        let gender: Vec<f64> = records.iter().map(|r| r.gender()).collect();

        Some(Self {
            neighborhood: neighborhood.to_string(),
            restaurant_count: records.len(),
            avg_attractive: round2(mean(&attractive)?),
            avg_age: round2(mean(&age)?),
            avg_gender: round2(mean(&gender)?),
            median_attractive: round2(median(&attractive)?),
            std_attractive: round2(sample_std(&attractive).unwrap_or(0.0)),
        })
    }
}

// ---------------------------------------------------------------------------
// RankMetric
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    #[value(name = "avg_attractive")]
    AvgAttractive,
    #[value(name = "avg_age")]
    AvgAge,
    #[value(name = "avg_gender")]
    AvgGender,
    #[value(name = "restaurant_count")]
    RestaurantCount,
}

impl RankMetric {
    pub const ALL: [RankMetric; 4] = [
        RankMetric::AvgAttractive,
        RankMetric::AvgAge,
        RankMetric::AvgGender,
        RankMetric::RestaurantCount,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            RankMetric::AvgAttractive => "avg_attractive",
            RankMetric::AvgAge => "avg_age",
            RankMetric::AvgGender => "avg_gender",
            RankMetric::RestaurantCount => "restaurant_count",
        }
    }

    pub fn value(&self, stat: &NeighborhoodStat) -> f64 {
        match self {
            RankMetric::AvgAttractive => stat.avg_attractive,
            RankMetric::AvgAge => stat.avg_age,
            RankMetric::AvgGender => stat.avg_gender,
            RankMetric::RestaurantCount => stat.restaurant_count as f64,
        }
    }

    /// Lower gender score reads as "more female", so that metric ranks ascending.
    pub fn ascending(&self) -> bool {
        matches!(self, RankMetric::AvgGender)
    }
}

// ---------------------------------------------------------------------------
// NeighborhoodTable
// ---------------------------------------------------------------------------

/// Neighborhood stats, most restaurants first (ties keep first-seen order).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeighborhoodTable {
    stats: Vec<NeighborhoodStat>,
}

impl NeighborhoodTable {
    pub fn stats(&self) -> &[NeighborhoodStat] {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn get(&self, neighborhood: &str) -> Option<&NeighborhoodStat> {
        self.stats.iter().find(|s| s.neighborhood == neighborhood)
    }

    pub fn total_restaurants(&self) -> usize {
        self.stats.iter().map(|s| s.restaurant_count).sum()
    }

    /// Highest average attractiveness first.
    pub fn hottest(&self) -> Vec<&NeighborhoodStat> {
        self.ranked(RankMetric::AvgAttractive)
    }

    /// Highest average age score first.
    pub fn youngest(&self) -> Vec<&NeighborhoodStat> {
        self.ranked(RankMetric::AvgAge)
    }

    /// Lowest average gender score first.
    pub fn most_female(&self) -> Vec<&NeighborhoodStat> {
        self.ranked(RankMetric::AvgGender)
    }

    pub fn top(&self, metric: RankMetric, n: usize) -> Vec<&NeighborhoodStat> {
        let mut ranked = self.ranked(metric);
        ranked.truncate(n);
        ranked
    }

    /// All rows ordered by `metric`. Stable, so ties keep table order.
    pub fn ranked(&self, metric: RankMetric) -> Vec<&NeighborhoodStat> {
        let mut rows: Vec<&NeighborhoodStat> = self.stats.iter().collect();
        rows.sort_by(|a, b| {
            let ord = metric.value(a).total_cmp(&metric.value(b));
            if metric.ascending() {
                ord
            } else {
                ord.reverse()
            }
        });
        rows
    }
}

/// Filter to allow-listed neighborhoods, group, and compute per-group stats.
pub fn aggregate(records: &[Record]) -> NeighborhoodTable {
    let mut groups: IndexMap<&str, Vec<&Record>> = IndexMap::new();
    let mut dropped = 0usize;

    for record in records {
        match record.hood.as_deref() {
            Some(hood) if is_manhattan(hood) => groups.entry(hood).or_default().push(record),
            _ => dropped += 1,
        }
    }
    debug!(kept = records.len() - dropped, dropped, "Filtered to Manhattan neighborhoods");

    let mut stats: Vec<NeighborhoodStat> = groups
        .iter()
        .filter_map(|(hood, group)| NeighborhoodStat::from_group(hood, group))
        .collect();
    stats.sort_by(|a, b| b.restaurant_count.cmp(&a.restaurant_count));

    info!(neighborhoods = stats.len(), "Calculated neighborhood statistics");
    NeighborhoodTable { stats }
}

// ---------------------------------------------------------------------------
// Numeric helpers
// ---------------------------------------------------------------------------

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

/// Sample (n - 1) standard deviation; undefined below two values.
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoodrank_common::RawScore;

    fn rec(name: &str, hood: &str, a: &str, age: &str, g: &str) -> Record {
        let mut r = Record::new(name).unwrap();
        r.hood = Some(hood.to_string());
        r.attractive_score = Some(RawScore::from(a));
        r.age_score = Some(RawScore::from(age));
        r.gender_score = Some(RawScore::from(g));
        r
    }

    // --- Aggregation ---

    #[test]
    fn means_are_rounded_to_two_places() {
        let table = aggregate(&[
            rec("a", "SoHo", "8.0", "7.0", "5.0"),
            rec("b", "SoHo", "6.0", "5.0", "3.0"),
            rec("c", "SoHo", "7.0", "6.0", "4.5"),
        ]);
        let soho = table.get("SoHo").unwrap();
        assert_eq!(soho.restaurant_count, 3);
        assert_eq!(soho.avg_attractive, 7.0);
        assert_eq!(soho.avg_gender, 4.17);
        assert_eq!(soho.median_attractive, 7.0);
        assert_eq!(soho.std_attractive, 1.0);
    }

    #[test]
    fn single_record_group_has_zero_std() {
        let table = aggregate(&[rec("a", "Chelsea", "9", "9", "9")]);
        assert_eq!(table.stats()[0].std_attractive, 0.0);
    }

    #[test]
    fn invalid_scores_count_as_zero() {
        let mut missing = Record::new("m").unwrap();
        missing.hood = Some("Tribeca".into());
        let table = aggregate(&[rec("x", "Tribeca", "oops", "4", "4"), missing]);
        let tribeca = table.get("Tribeca").unwrap();
        assert_eq!(tribeca.avg_attractive, 0.0);
        assert_eq!(tribeca.avg_age, 2.0);
    }

    #[test]
    fn non_manhattan_and_unknown_are_dropped() {
        let mut no_hood = Record::new("n").unwrap();
        no_hood.attractive_score = Some(RawScore::from("9"));
        let table = aggregate(&[
            rec("a", "Williamsburg", "9", "9", "9"),
            rec("b", "soho", "9", "9", "9"),
            no_hood,
        ]);
        assert!(table.is_empty());
    }

    // --- Ordering ---

    #[test]
    fn table_sorted_by_count_with_stable_ties() {
        let table = aggregate(&[
            rec("a", "NoHo", "1", "1", "1"),
            rec("b", "Chelsea", "1", "1", "1"),
            rec("c", "Chelsea", "1", "1", "1"),
            rec("d", "Inwood", "1", "1", "1"),
        ]);
        let order: Vec<_> = table.stats().iter().map(|s| s.neighborhood.as_str()).collect();
        assert_eq!(order, vec!["Chelsea", "NoHo", "Inwood"]);
    }

    #[test]
    fn views_sort_in_their_own_direction() {
        let table = aggregate(&[
            rec("a", "NoHo", "6", "8", "7"),
            rec("b", "Chelsea", "9", "5", "3"),
            rec("c", "Inwood", "7", "9", "5"),
        ]);
        let hood = |v: Vec<&NeighborhoodStat>| -> Vec<String> {
            v.into_iter().map(|s| s.neighborhood.clone()).collect()
        };
        assert_eq!(hood(table.hottest()), vec!["Chelsea", "Inwood", "NoHo"]);
        assert_eq!(hood(table.youngest()), vec!["Inwood", "NoHo", "Chelsea"]);
        assert_eq!(hood(table.most_female()), vec!["Chelsea", "Inwood", "NoHo"]);
        assert_eq!(hood(table.top(RankMetric::AvgAttractive, 1)), vec!["Chelsea"]);
    }

    // --- Helpers ---

    #[test]
    fn median_of_even_count() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }
}

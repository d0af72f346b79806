use std::fmt;

use crate::aggregate::{NeighborhoodStat, NeighborhoodTable, RankMetric};

/// One ranked text table: neighborhood, the metric, restaurant count.
pub struct Ranking<'a> {
    pub title: String,
    pub metric: RankMetric,
    pub rows: Vec<&'a NeighborhoodStat>,
}

impl<'a> Ranking<'a> {
    pub fn new(title: impl Into<String>, metric: RankMetric, rows: Vec<&'a NeighborhoodStat>) -> Self {
        Self {
            title: title.into(),
            metric,
            rows,
        }
    }

    /// The three standard rankings: attractiveness, youth, female ratio.
    pub fn standard(table: &'a NeighborhoodTable) -> [Ranking<'a>; 3] {
        [
            Ranking::new(
                "MANHATTAN NEIGHBORHOODS RANKED BY ATTRACTIVENESS",
                RankMetric::AvgAttractive,
                table.hottest(),
            ),
            Ranking::new(
                "MANHATTAN NEIGHBORHOODS RANKED BY YOUTH",
                RankMetric::AvgAge,
                table.youngest(),
            ),
            Ranking::new(
                "MANHATTAN NEIGHBORHOODS RANKED BY FEMALE RATIO",
                RankMetric::AvgGender,
                table.most_female(),
            ),
        ]
    }
}

impl fmt::Display for Ranking<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .rows
            .iter()
            .map(|s| s.neighborhood.chars().count())
            .max()
            .unwrap_or(0)
            .max("neighborhood".len());

        writeln!(f, "=== {} ===", self.title)?;
        writeln!(
            f,
            "{:<width$}  {:>16}  {:>16}",
            "neighborhood",
            self.metric.column(),
            "restaurant_count"
        )?;
        for stat in &self.rows {
            let value = match self.metric {
                RankMetric::RestaurantCount => stat.restaurant_count.to_string(),
                metric => format!("{:.2}", metric.value(stat)),
            };
            writeln!(
                f,
                "{:<width$}  {:>16}  {:>16}",
                stat.neighborhood, value, stat.restaurant_count
            )?;
        }
        Ok(())
    }
}

/// The three standard rankings, blank-line separated.
pub fn full_report(table: &NeighborhoodTable) -> String {
    Ranking::standard(table)
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

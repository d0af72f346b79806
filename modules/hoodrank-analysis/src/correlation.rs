use std::fmt;

use crate::aggregate::{mean, NeighborhoodStat, RankMetric};

/// Pearson correlation between every pair of [`RankMetric`] columns.
/// A cell is `None` when it is undefined (fewer than two rows or a constant column).
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<RankMetric>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: RankMetric, col: RankMetric) -> Option<f64> {
        let i = self.columns.iter().position(|c| *c == row)?;
        let j = self.columns.iter().position(|c| *c == col)?;
        self.values[i][j]
    }
}

pub fn correlation_matrix(stats: &[NeighborhoodStat]) -> CorrelationMatrix {
    let columns = RankMetric::ALL.to_vec();
    let series: Vec<Vec<f64>> = columns
        .iter()
        .map(|metric| stats.iter().map(|s| metric.value(s)).collect())
        .collect();

    let values = series
        .iter()
        .enumerate()
        .map(|(i, xs)| {
            series
                .iter()
                .enumerate()
                .map(|(j, ys)| {
                    let r = pearson(xs, ys)?;
                    Some(if i == j { 1.0 } else { r })
                })
                .collect()
        })
        .collect();

    CorrelationMatrix { columns, values }
}

fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() < 2 || xs.len() != ys.len() {
        return None;
    }
    let (mx, my) = (mean(xs)?, mean(ys)?);
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mx) * (y - my);
        vx += (x - mx).powi(2);
        vy += (y - my).powi(2);
    }
    if vx == 0.0 || vy == 0.0 {
        return None;
    }
    Some((cov / (vx.sqrt() * vy.sqrt())).clamp(-1.0, 1.0))
}

impl fmt::Display for CorrelationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>18}", "")?;
        for col in &self.columns {
            write!(f, "{:>18}", col.column())?;
        }
        writeln!(f)?;
        for (row, values) in self.columns.iter().zip(&self.values) {
            write!(f, "{:>18}", row.column())?;
            for value in values {
                match value {
                    Some(v) => write!(f, "{v:>18.4}")?,
                    None => write!(f, "{:>18}", "NaN")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(hood: &str, count: usize, a: f64, age: f64, g: f64) -> NeighborhoodStat {
        NeighborhoodStat {
            neighborhood: hood.to_string(),
            restaurant_count: count,
            avg_attractive: a,
            avg_age: age,
            avg_gender: g,
            median_attractive: a,
            std_attractive: 0.0,
        }
    }

    #[test]
    fn perfectly_related_columns() {
        let stats = vec![
            stat("SoHo", 1, 5.0, 2.0, 9.0),
            stat("NoHo", 2, 6.0, 4.0, 8.0),
            stat("Tribeca", 3, 7.0, 6.0, 7.0),
        ];
        let m = correlation_matrix(&stats);

        let r = |a, b| m.get(a, b).unwrap();
        assert!((r(RankMetric::AvgAttractive, RankMetric::AvgAge) - 1.0).abs() < 1e-9);
        assert!((r(RankMetric::AvgAttractive, RankMetric::AvgGender) + 1.0).abs() < 1e-9);
        assert_eq!(r(RankMetric::RestaurantCount, RankMetric::RestaurantCount), 1.0);
    }

    #[test]
    fn constant_column_is_undefined() {
        let stats = vec![stat("SoHo", 1, 5.0, 2.0, 4.0), stat("NoHo", 1, 6.0, 3.0, 4.0)];
        let m = correlation_matrix(&stats);
        assert_eq!(m.get(RankMetric::AvgGender, RankMetric::AvgAge), None);
        assert_eq!(m.get(RankMetric::AvgGender, RankMetric::AvgGender), None);
        assert_eq!(m.get(RankMetric::RestaurantCount, RankMetric::AvgAttractive), None);
    }

    #[test]
    fn single_row_is_all_undefined() {
        let m = correlation_matrix(&[stat("SoHo", 1, 5.0, 2.0, 4.0)]);
        assert!(m.values.iter().flatten().all(Option::is_none));
        assert!(m.to_string().contains("NaN"));
    }
}

pub mod aggregate;
pub mod allow_list;
pub mod correlation;
pub mod report;
pub mod summary;

pub use aggregate::{aggregate, NeighborhoodStat, NeighborhoodTable, RankMetric};
pub use allow_list::{is_manhattan, MANHATTAN_NEIGHBORHOODS};
pub use correlation::{correlation_matrix, CorrelationMatrix};
pub use report::{full_report, Ranking};
pub use summary::{summarize, SummaryStatistics};

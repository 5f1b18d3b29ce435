pub mod metric;
pub mod rank_table;
pub mod weight;

pub use metric::MetricRepository;
pub use rank_table::RankTableRepository;
pub use weight::WeightRepository;

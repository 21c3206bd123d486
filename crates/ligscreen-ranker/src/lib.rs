//! ligscreen-ranker: combined docking/co-folding score and candidate ranking.

pub mod scorer;

pub use ligscreen_common::stats;
pub use scorer::{combined_score, rank_files, rank_table, Ranking, RankingSummary, KEPT_COLUMNS};

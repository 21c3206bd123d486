//! Combined score and ranking of ligands that have both a Vina and a Boltz
//! affinity.
//!
//! combined = (vina_affinity - boltz_affinity_kcalmol) / 2
//!
//! Vina affinities are negative for binders and Boltz kcal/mol values are
//! positive, so lower (more negative) is better on both terms.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use ligscreen_common::{format_opt_float, stats, CsvTable, Result};

pub const SMILES: &str = "smiles";
pub const ID: &str = "id-num";
pub const VINA: &str = "vina_affinity";
pub const BOLTZ: &str = "boltz_affinity_kcalmol";
pub const PRED: &str = "avg_affinity_pred_value";
pub const PROB: &str = "avg_affinity_probability_binary";
pub const COMBINED: &str = "combined_score";

/// Columns carried into the sorted and best lists.
pub const KEPT_COLUMNS: [&str; 6] = [SMILES, ID, VINA, BOLTZ, PRED, PROB];

pub fn combined_score(vina: f64, boltz: f64) -> f64 {
    (vina - boltz) / 2.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopStats {
    pub best_combined: f64,
    /// Combined score at position `top_n`, when there are that many.
    pub nth_best_combined: Option<f64>,
    pub avg_vina: f64,
    pub avg_boltz: f64,
    pub avg_pred_value: Option<f64>,
    pub avg_probability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingSummary {
    pub total: usize,
    pub with_vina: usize,
    pub with_boltz: usize,
    pub with_both: usize,
    /// (min, max) over rows with both affinities.
    pub vina_range: Option<(f64, f64)>,
    pub boltz_range: Option<(f64, f64)>,
    pub top_n: usize,
    pub top_stats: Option<TopStats>,
}

/// Output of [`rank_table`].
#[derive(Debug, Clone)]
pub struct Ranking {
    /// Kept columns plus `combined_score` when any row is complete.
    pub sorted: CsvTable,
    /// First `top_n` rows of `sorted`, kept columns only.
    pub best: CsvTable,
    pub summary: RankingSummary,
}

/// Rank the rows of a Boltz-merged table.
pub fn rank_table(table: &CsvTable, top_n: usize) -> Result<Ranking> {
    let kept = table.select(&KEPT_COLUMNS)?;
    let vina = kept.column_f64(2);
    let boltz = kept.column_f64(3);
    let pred = kept.column_f64(4);
    let prob = kept.column_f64(5);

    let mut complete: Vec<(usize, f64)> = Vec::new();
    let mut incomplete: Vec<usize> = Vec::new();
    for row in 0..kept.len() {
        match (vina[row], boltz[row]) {
            (Some(v), Some(b)) => complete.push((row, combined_score(v, b))),
            _ => incomplete.push(row),
        }
    }

    let vina_complete: Vec<f64> = complete.iter().filter_map(|&(r, _)| vina[r]).collect();
    let boltz_complete: Vec<f64> = complete.iter().filter_map(|&(r, _)| boltz[r]).collect();
    let range = |values: &[f64]| stats::min(values).zip(stats::max(values));

    // Stable: rows with equal scores keep their input order.
    complete.sort_by(|a, b| a.1.total_cmp(&b.1));

    let (sorted, top_stats) = if complete.is_empty() {
        (kept.clone(), None)
    } else {
        let order: Vec<usize> = complete
            .iter()
            .map(|&(r, _)| r)
            .chain(incomplete.iter().copied())
            .collect();
        let mut scores = vec![None; kept.len()];
        for &(r, s) in &complete {
            scores[r] = Some(s);
        }
        let mut with_score = kept.clone();
        with_score.set_column(COMBINED, scores.into_iter().map(format_opt_float).collect())?;

        let top: Vec<(usize, f64)> = complete.iter().take(top_n).copied().collect();
        let pick = |col: &[Option<f64>]| -> Vec<f64> { top.iter().filter_map(|&(r, _)| col[r]).collect() };
        let top_stats = TopStats {
            best_combined: complete[0].1,
            nth_best_combined: top_n.checked_sub(1).and_then(|i| top.get(i)).map(|&(_, s)| s),
            avg_vina: stats::mean(&pick(&vina)).unwrap_or_default(),
            avg_boltz: stats::mean(&pick(&boltz)).unwrap_or_default(),
            avg_pred_value: stats::mean(&pick(&pred)),
            avg_probability: stats::mean(&pick(&prob)),
        };
        (with_score.reorder(&order), Some(top_stats))
    };

    let best = sorted.head(top_n).select(&KEPT_COLUMNS)?;

    let summary = RankingSummary {
        total: kept.len(),
        with_vina: vina.iter().flatten().count(),
        with_boltz: boltz.iter().flatten().count(),
        with_both: complete.len(),
        vina_range: range(&vina_complete),
        boltz_range: range(&boltz_complete),
        top_n,
        top_stats,
    };

    Ok(Ranking { sorted, best, summary })
}

/// Read `input`, rank it and write the sorted and best lists.
pub fn rank_files(input: &Path, sorted_path: &Path, best_path: &Path, top_n: usize) -> Result<Ranking> {
    let table = CsvTable::read(input)?;
    let ranking = rank_table(&table, top_n)?;

    ranking.sorted.write(sorted_path)?;
    ranking.best.write(best_path)?;
    info!(
        rows = ranking.sorted.len(),
        complete = ranking.summary.with_both,
        sorted = %sorted_path.display(),
        best = %best_path.display(),
        "Ranking written"
    );

    Ok(ranking)
}

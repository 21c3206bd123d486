//! Collect the best Vina affinity of every docked ligand and merge it into the
//! ligand list.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use ligscreen_common::{format_float, normalize_key, stats, CsvTable, LigscreenError, Result};

use crate::ligand::ID_COLUMN;

pub const AFFINITY_COLUMN: &str = "vina_affinity";

fn best_mode_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // "   1       -9.723          0          0"
    RE.get_or_init(|| Regex::new(r"(?m)^\s*1\s+(-?\d+\.\d+)\s+").unwrap())
}

fn score_file_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)-vina-score\.txt$").unwrap())
}

/// Affinity of the first binding mode in a Vina results table.
pub fn extract_best_affinity(text: &str) -> Option<f64> {
    best_mode_regex()
        .captures(text)
        .and_then(|c| c[1].parse::<f64>().ok())
}

fn score_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut files: Vec<(String, PathBuf)> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let number = score_file_regex().captures(&name)?[1].to_string();
            Some((normalize_key(&number), entry.path()))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Best affinity per ligand id, read from `<n>-vina-score.txt` files.
///
/// When `poses_dir` holds no score files, `fallback_dir` is searched instead.
pub fn collect_scores(poses_dir: &Path, fallback_dir: Option<&Path>) -> Result<HashMap<String, f64>> {
    let mut files = score_files(poses_dir)?;

    if files.is_empty() {
        let listing: Vec<String> = fs::read_dir(poses_dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .take(10)
            .collect();
        debug!(dir = %poses_dir.display(), first_files = ?listing, "No score files found");

        if let Some(fallback) = fallback_dir.filter(|d| d.is_dir()) {
            files = score_files(fallback)?;
            if !files.is_empty() {
                info!(dir = %fallback.display(), count = files.len(), "Using score files from fallback directory");
            }
        }
    }
    info!(count = files.len(), "Found Vina score files");

    let mut affinities = HashMap::new();
    for (id, path) in files {
        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Could not read score file");
                continue;
            }
        };
        match extract_best_affinity(&text) {
            Some(affinity) => {
                affinities.insert(id, affinity);
            }
            None => warn!(file = %path.display(), "Could not find affinity value"),
        }
    }

    info!(count = affinities.len(), "Extracted affinity values");
    Ok(affinities)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffinityStats {
    pub best: f64,
    pub worst: f64,
    pub mean: f64,
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VinaSummary {
    pub id_column: String,
    pub total: usize,
    pub with_score: usize,
    pub missing_ids: Vec<String>,
    pub stats: Option<AffinityStats>,
    /// Up to ten (id, affinity) pairs, best first.
    pub top: Vec<(String, f64)>,
    pub output: PathBuf,
}

/// Add a `vina_affinity` column to the ligand list and write it to `output_csv`.
pub fn merge_vina_affinities(
    ligands_csv: &Path,
    poses_dir: &Path,
    fallback_dir: Option<&Path>,
    output_csv: &Path,
) -> Result<VinaSummary> {
    let mut table = CsvTable::read(ligands_csv)?;
    info!(path = %ligands_csv.display(), rows = table.len(), "Read ligand list");

    let id_col = match table.column_index(ID_COLUMN) {
        Some(col) => col,
        None if table.headers().len() > 1 => {
            warn!("'{ID_COLUMN}' column not found, using the second column as id");
            1
        }
        None => return Err(LigscreenError::MissingColumn(ID_COLUMN.to_string())),
    };
    let id_column = table.headers()[id_col].clone();

    if !poses_dir.is_dir() {
        return Err(LigscreenError::MissingInput(poses_dir.to_path_buf()));
    }

    let affinities = collect_scores(poses_dir, fallback_dir)?;
    let lookup: HashMap<String, String> = affinities
        .iter()
        .map(|(id, v)| (id.clone(), format_float(*v)))
        .collect();
    let matched = table.map_column(id_col, AFFINITY_COLUMN, &lookup)?;

    let affinity_col = table.require_column(AFFINITY_COLUMN)?;
    let mut scored: Vec<(String, f64)> = Vec::with_capacity(matched);
    let mut missing_ids = Vec::new();
    for row in 0..table.len() {
        let id = table.value(row, id_col).to_string();
        match table.parse_f64(row, affinity_col) {
            Some(v) => scored.push((id, v)),
            None => missing_ids.push(id),
        }
    }
    if !missing_ids.is_empty() {
        warn!(count = missing_ids.len(), "Ligands without affinity scores");
    }

    table.write(output_csv)?;
    info!(path = %output_csv.display(), "Results saved");

    let values: Vec<f64> = scored.iter().map(|(_, v)| *v).collect();
    let stats = match (
        stats::min(&values),
        stats::max(&values),
        stats::mean(&values),
        stats::median(&values),
    ) {
        (Some(best), Some(worst), Some(mean), Some(median)) => Some(AffinityStats {
            best,
            worst,
            mean,
            median,
        }),
        _ => None,
    };

    // Stable sort keeps row order among equal affinities.
    let mut top = scored;
    top.sort_by(|a, b| a.1.total_cmp(&b.1));
    top.truncate(10);

    Ok(VinaSummary {
        id_column,
        total: table.len(),
        with_score: values.len(),
        missing_ids,
        stats,
        top,
        output: output_csv.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const VINA_OUTPUT: &str = "\
Scoring function : vina
Performing docking (random seed: -1436455542) ... done.

mode |   affinity | dist from best mode
     | (kcal/mol) | rmsd l.b.| rmsd u.b.
-----+------------+----------+----------
   1       -9.723          0          0
   2       -9.401      1.873      2.614
  10       -8.1        3.2        5.0
";

    #[test]
    fn test_extract_best_affinity() {
        assert_eq!(extract_best_affinity(VINA_OUTPUT), Some(-9.723));
        assert_eq!(extract_best_affinity("   1       7.5   0   0\n"), Some(7.5));
        assert_eq!(extract_best_affinity("no table here"), None);
        // integer affinities are not matched
        assert_eq!(extract_best_affinity("   1       -9          0   0\n"), None);
    }

    #[test]
    fn test_collect_scores_skips_unparseable() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("0-vina-score.txt"), VINA_OUTPUT).unwrap();
        fs::write(dir.path().join("1-vina-score.txt"), "vina crashed\n").unwrap();
        fs::write(dir.path().join("x-vina-score.txt"), VINA_OUTPUT).unwrap();

        let scores = collect_scores(dir.path(), None).unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores["0"], -9.723);
    }

    #[test]
    fn test_collect_scores_uses_fallback() {
        let poses = tempdir().unwrap();
        let fallback = tempdir().unwrap();
        fs::write(poses.path().join("readme.txt"), "").unwrap();
        fs::write(fallback.path().join("007-vina-score.txt"), VINA_OUTPUT).unwrap();

        let scores = collect_scores(poses.path(), Some(fallback.path())).unwrap();
        assert_eq!(scores.get("7"), Some(&-9.723));
    }

    #[test]
    fn test_merge_vina_affinities() {
        let dir = tempdir().unwrap();
        let poses = dir.path().join("poses");
        fs::create_dir(&poses).unwrap();
        fs::write(poses.join("0-vina-score.txt"), VINA_OUTPUT).unwrap();
        fs::write(poses.join("2-vina-score.txt"), "   1       -7.5   0   0\n").unwrap();

        let list = dir.path().join("list.csv");
        fs::write(&list, "smiles,id-num\nCCO,0\nCCN,1\nCCC,2\n").unwrap();
        let output = poses.join("list_with_affinities.csv");

        let summary = merge_vina_affinities(&list, &poses, None, &output).unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.with_score, 2);
        assert_eq!(summary.missing_ids, vec!["1".to_string()]);
        assert_eq!(summary.top, vec![("0".to_string(), -9.723), ("2".to_string(), -7.5)]);
        let stats = summary.stats.unwrap();
        assert_eq!(stats.best, -9.723);
        assert_eq!(stats.worst, -7.5);

        let text = fs::read_to_string(&output).unwrap();
        assert_eq!(text, "smiles,id-num,vina_affinity\nCCO,0,-9.723\nCCN,1,\nCCC,2,-7.5\n");
    }

    #[test]
    fn test_merge_falls_back_to_second_column() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("3-vina-score.txt"), VINA_OUTPUT).unwrap();
        let list = dir.path().join("list.csv");
        fs::write(&list, "smiles,ligand\nCCO,3\n").unwrap();

        let summary =
            merge_vina_affinities(&list, dir.path(), None, &dir.path().join("out.csv")).unwrap();
        assert_eq!(summary.id_column, "ligand");
        assert_eq!(summary.with_score, 1);
    }

    #[test]
    fn test_merge_requires_poses_dir() {
        let dir = tempdir().unwrap();
        let list = dir.path().join("list.csv");
        fs::write(&list, "smiles,id-num\nCCO,0\n").unwrap();
        let err = merge_vina_affinities(&list, &dir.path().join("poses"), None, &dir.path().join("o.csv"))
            .unwrap_err();
        assert!(matches!(err, LigscreenError::MissingInput(_)));
    }
}

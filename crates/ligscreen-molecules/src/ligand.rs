//! Ligand list preparation: numbering the source SMILES list and converting
//! each entry to PDBQT with the Meeko toolchain (`scrub.py`, then
//! `mk_prepare_ligand.py`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use ligscreen_common::{run_tool, LigscreenError, Result};

/// Header of the id column added to the ligand list.
pub const ID_COLUMN: &str = "id-num";

/// Find `<prefix>*.csv` in `dir`, add an `id-num` column after the first
/// column and write the result to `dir/list_file`.
///
/// Returns the written path, or `None` when there is no source file or it is
/// empty.
pub fn add_id_column(dir: &Path, source_prefix: &str, list_file: &str) -> Result<Option<PathBuf>> {
    let mut sources: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(source_prefix) && n.ends_with(".csv"))
        })
        .collect();
    sources.sort();

    let Some(source) = sources.first() else {
        warn!(dir = %dir.display(), prefix = source_prefix, "No source CSV found");
        return Ok(None);
    };
    if sources.len() > 1 {
        warn!(
            count = sources.len(),
            using = %source.display(),
            "Several source CSV files found, using the first"
        );
    }

    info!(source = %source.display(), "Numbering ligand list");

    let rows = read_rows(source)?;
    let Some((header, data)) = rows.split_first() else {
        warn!(source = %source.display(), "Source CSV is empty");
        return Ok(None);
    };

    let output = dir.join(list_file);
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(&output)?;
    writer.write_record(with_id(header, ID_COLUMN))?;

    // Ids follow the data-row position, so a blank line still uses up its id.
    let mut written = 0usize;
    for (idx, record) in data.iter().enumerate() {
        if record.is_empty() {
            continue;
        }
        writer.write_record(with_id(record, &idx.to_string()))?;
        written += 1;
    }
    writer.flush()?;

    info!(output = %output.display(), rows = written, "Wrote numbered ligand list");
    Ok(Some(output))
}

/// Read a CSV file one line at a time, keeping each blank line as an empty
/// record. Quoted fields spanning several lines are not supported.
fn read_rows(path: &Path) -> Result<Vec<csv::StringRecord>> {
    fs::read_to_string(path)?
        .lines()
        .map(|line| -> Result<csv::StringRecord> {
            if line.is_empty() {
                return Ok(csv::StringRecord::new());
            }
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_reader(line.as_bytes());
            Ok(reader.records().next().transpose()?.unwrap_or_default())
        })
        .collect()
}

fn with_id(record: &csv::StringRecord, id: &str) -> Vec<String> {
    let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
    let at = fields.len().min(1);
    fields.insert(at, id.to_string());
    fields
}

/// Settings for the SMILES → SDF → PDBQT conversion.
#[derive(Debug, Clone)]
pub struct PreparationConfig {
    /// Directory holding the list; outputs are written here too.
    pub dir: PathBuf,
    pub list_file: String,
    pub scrub_executable: String,
    pub mk_prepare_executable: String,
    /// Stop after this many consecutive unusable rows.
    pub max_consecutive_empty: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LigandFailure {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreparationReport {
    /// Ids that were attempted, in order.
    pub processed_ids: Vec<String>,
    pub successful_conversions: usize,
    pub failures: Vec<LigandFailure>,
    pub missing_sdf: Vec<String>,
    pub missing_pdbqt: Vec<String>,
    /// Processing stopped on consecutive empty rows.
    pub stopped_on_empty_rows: bool,
}

impl PreparationReport {
    /// Percentage of processed ligands converted to PDBQT.
    pub fn success_rate(&self) -> Option<f64> {
        if self.processed_ids.is_empty() {
            None
        } else {
            Some(self.successful_conversions as f64 / self.processed_ids.len() as f64 * 100.0)
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.successful_conversions == self.processed_ids.len() && self.missing_pdbqt.is_empty()
    }

    fn fail(&mut self, id: &str, reason: impl Into<String>) {
        self.failures.push(LigandFailure {
            id: id.to_string(),
            reason: reason.into(),
        });
    }
}

/// File name of the SDF written by `scrub.py` for ligand `id`.
pub fn sdf_name(id: &str) -> String {
    format!("{id}-prepared.sdf")
}

/// File name of the docking-ready PDBQT for ligand `id`.
pub fn pdbqt_name(id: &str) -> String {
    format!("{id}-prepared.pdbqt")
}

enum Step {
    Ok,
    Failed,
    Missing,
}

/// Run one external step, recording failures on `report`.
async fn run_step(
    report: &mut PreparationReport,
    id: &str,
    program: &str,
    args: &[&str],
    cwd: &Path,
) -> Result<Step> {
    match run_tool(program, args, Some(cwd)).await {
        Ok(out) if out.success => Ok(Step::Ok),
        Ok(out) => {
            warn!(
                id,
                program,
                code = ?out.status_code,
                stderr = %out.stderr.trim(),
                "Ligand preparation step failed"
            );
            report.fail(id, format!("{program} failed"));
            Ok(Step::Failed)
        }
        Err(LigscreenError::ToolNotFound { tool }) => {
            error!(tool = %tool, "Executable not found, check your PATH");
            report.fail(id, format!("{tool} not found"));
            Ok(Step::Missing)
        }
        Err(e) => Err(e),
    }
}

/// Convert every ligand of the list to PDBQT, sequentially.
pub async fn prepare_ligands(config: &PreparationConfig) -> Result<PreparationReport> {
    let list_path = config.dir.join(&config.list_file);
    if !list_path.exists() {
        return Err(LigscreenError::MissingInput(list_path));
    }

    let rows = read_rows(&list_path)?;
    let data: &[csv::StringRecord] = match rows.split_first() {
        Some((header, data)) => {
            debug!(header = ?header, "Ligand list header");
            data
        }
        None => &[],
    };

    let mut report = PreparationReport::default();
    let mut consecutive_empty = 0usize;

    for record in data {
        let smiles = record.get(0).map(str::trim).unwrap_or("");
        let id = record.get(1).map(str::trim).unwrap_or("");

        if record.len() < 2 || smiles.is_empty() || id.is_empty() {
            consecutive_empty += 1;
            if consecutive_empty >= config.max_consecutive_empty {
                warn!(
                    rows = config.max_consecutive_empty,
                    "Too many consecutive empty rows, stopping"
                );
                report.stopped_on_empty_rows = true;
                break;
            }
            continue;
        }
        consecutive_empty = 0;
        report.processed_ids.push(id.to_string());
        info!(n = report.processed_ids.len(), id, smiles, "Preparing ligand");

        let sdf = sdf_name(id);
        let pdbqt = pdbqt_name(id);

        match run_step(
            &mut report,
            id,
            &config.scrub_executable,
            &[smiles, "-o", sdf.as_str()],
            &config.dir,
        )
        .await?
        {
            Step::Ok => debug!(id, sdf = %sdf, "SDF written"),
            Step::Failed => continue,
            Step::Missing => break,
        }

        match run_step(
            &mut report,
            id,
            &config.mk_prepare_executable,
            &["-i", sdf.as_str(), "-o", pdbqt.as_str()],
            &config.dir,
        )
        .await?
        {
            Step::Ok => {
                debug!(id, pdbqt = %pdbqt, "PDBQT written");
                report.successful_conversions += 1;
            }
            Step::Failed => {}
            Step::Missing => break,
        }
    }

    for id in &report.processed_ids {
        if !config.dir.join(sdf_name(id)).exists() {
            report.missing_sdf.push(id.clone());
        }
        if !config.dir.join(pdbqt_name(id)).exists() {
            report.missing_pdbqt.push(id.clone());
        }
    }

    info!(
        processed = report.processed_ids.len(),
        converted = report.successful_conversions,
        failed = report.failures.len(),
        "Ligand preparation finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_with_id_inserts_second_column() {
        let record = csv::StringRecord::from(vec!["CCO", "x", "y"]);
        assert_eq!(with_id(&record, "4"), vec!["CCO", "4", "x", "y"]);
        let single = csv::StringRecord::from(vec!["CCO"]);
        assert_eq!(with_id(&single, "0"), vec!["CCO", "0"]);
    }

    #[test]
    fn test_read_rows_keeps_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        fs::write(&path, "smiles,id-num\r\n\r\n\"C(=O)O,x\",1\n,\n").unwrap();

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows[1].is_empty());
        assert_eq!(rows[2].iter().collect::<Vec<_>>(), vec!["C(=O)O,x", "1"]);
        assert_eq!(rows[3].iter().collect::<Vec<_>>(), vec!["", ""]);
    }

    #[test]
    fn test_add_id_column() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("cheese_hits.csv"),
            "smiles,score\nCCO,0.9\n\nc1ccccc1,0.8\n",
        )
        .unwrap();

        let out = add_id_column(dir.path(), "cheese", "list.csv").unwrap().unwrap();
        assert_eq!(out, dir.path().join("list.csv"));
        let text = fs::read_to_string(out).unwrap();
        assert_eq!(text, "smiles,id-num,score\nCCO,0,0.9\nc1ccccc1,2,0.8\n");
    }

    #[test]
    fn test_add_id_column_picks_first_sorted_source() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("cheese_b.csv"), "smiles\nCCN\n").unwrap();
        fs::write(dir.path().join("cheese_a.csv"), "smiles\nCCO\n").unwrap();
        fs::write(dir.path().join("cheese_c.txt"), "smiles\nCCC\n").unwrap();

        let out = add_id_column(dir.path(), "cheese", "list.csv").unwrap().unwrap();
        let text = fs::read_to_string(out).unwrap();
        assert_eq!(text, "smiles,id-num\nCCO,0\n");
    }

    #[test]
    fn test_add_id_column_without_source() {
        let dir = tempdir().unwrap();
        assert_eq!(add_id_column(dir.path(), "cheese", "list.csv").unwrap(), None);

        fs::write(dir.path().join("cheese.csv"), "").unwrap();
        assert_eq!(add_id_column(dir.path(), "cheese", "list.csv").unwrap(), None);
        assert!(!dir.path().join("list.csv").exists());
    }

    #[test]
    fn test_report_rates() {
        let mut report = PreparationReport::default();
        assert_eq!(report.success_rate(), None);
        assert!(report.all_succeeded());

        report.processed_ids = vec!["0".into(), "1".into()];
        report.successful_conversions = 1;
        report.missing_pdbqt = vec!["1".into()];
        assert_eq!(report.success_rate(), Some(50.0));
        assert!(!report.all_succeeded());
    }

    #[tokio::test]
    async fn test_prepare_ligands_missing_list() {
        let dir = tempdir().unwrap();
        let config = PreparationConfig {
            dir: dir.path().to_path_buf(),
            list_file: "list.csv".into(),
            scrub_executable: "scrub.py".into(),
            mk_prepare_executable: "mk_prepare_ligand.py".into(),
            max_consecutive_empty: 5,
        };
        let err = prepare_ligands(&config).await.unwrap_err();
        assert!(matches!(err, LigscreenError::MissingInput(_)));
    }

    #[tokio::test]
    async fn test_prepare_ligands_stops_on_blank_lines() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("list.csv"), "smiles,id-num\n\n\n\n\n\nCCO,0\n").unwrap();
        let config = PreparationConfig {
            dir: dir.path().to_path_buf(),
            list_file: "list.csv".into(),
            scrub_executable: "ligscreen-test-no-such-scrub".into(),
            mk_prepare_executable: "ligscreen-test-no-such-mk".into(),
            max_consecutive_empty: 5,
        };
        let report = prepare_ligands(&config).await.unwrap();
        assert!(report.stopped_on_empty_rows);
        assert!(report.processed_ids.is_empty());
        assert!(report.failures.is_empty());
    }
}

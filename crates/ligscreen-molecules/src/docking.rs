//! Molecular docking using AutoDock Vina.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use ligscreen_common::{run_tool, LigscreenError, Result};

/// Suffix of prepared ligand files picked up for docking.
pub const LIGAND_SUFFIX: &str = "-prepared.pdbqt";
pub const SCORE_SUFFIX: &str = "-vina-score.txt";
pub const POSE_SUFFIX: &str = "-vina-out.pdbqt";

/// Where Vina should search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchBox {
    /// A Vina `--config` file holding the box definition.
    ConfigFile(PathBuf),
    Explicit { center: [f64; 3], size: [f64; 3] },
}

impl SearchBox {
    /// Parse a Vina box file (`center_x = 1.0` lines) into an explicit box.
    pub fn read_box_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let mut center = [None; 3];
        let mut size = [None; 3];
        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let slot = match key.trim() {
                "center_x" => &mut center[0],
                "center_y" => &mut center[1],
                "center_z" => &mut center[2],
                "size_x" => &mut size[0],
                "size_y" => &mut size[1],
                "size_z" => &mut size[2],
                _ => continue,
            };
            let parsed = value.trim().parse::<f64>().map_err(|e| {
                LigscreenError::Parse(format!("{}: bad value for {}: {e}", path.display(), key.trim()))
            })?;
            *slot = Some(parsed);
        }

        let take = |values: [Option<f64>; 3], prefix: &str| -> Result<[f64; 3]> {
            let mut out = [0.0; 3];
            for (i, axis) in ["x", "y", "z"].iter().enumerate() {
                out[i] = values[i].ok_or_else(|| {
                    LigscreenError::Parse(format!("{}: missing {prefix}_{axis}", path.display()))
                })?;
            }
            Ok(out)
        };

        Ok(SearchBox::Explicit {
            center: take(center, "center")?,
            size: take(size, "size")?,
        })
    }

    fn args(&self) -> Vec<String> {
        match self {
            SearchBox::ConfigFile(path) => vec!["--config".into(), path.display().to_string()],
            SearchBox::Explicit { center, size } => {
                let mut args = Vec::with_capacity(12);
                for (axis, value) in ["x", "y", "z"].iter().zip(center) {
                    args.push(format!("--center_{axis}"));
                    args.push(value.to_string());
                }
                for (axis, value) in ["x", "y", "z"].iter().zip(size) {
                    args.push(format!("--size_{axis}"));
                    args.push(value.to_string());
                }
                args
            }
        }
    }
}

/// Configuration for a single docking run.
#[derive(Debug, Clone)]
pub struct DockingJob {
    pub receptor: PathBuf,
    pub ligand: PathBuf,
    pub search_box: SearchBox,
    pub exhaustiveness: u32,
    pub num_modes: u32,
    /// Output poses.
    pub out: PathBuf,
    /// Vina's stdout is written here.
    pub score_file: PathBuf,
}

/// Wrapper for AutoDock Vina execution.
pub struct VinaRunner {
    executable_path: PathBuf,
}

impl VinaRunner {
    /// Runner for the `vina` binary at `executable_path` (a bare name is
    /// looked up on PATH).
    pub fn new<P: AsRef<Path>>(executable_path: P) -> Self {
        Self {
            executable_path: executable_path.as_ref().to_path_buf(),
        }
    }

    /// Command-line arguments for `job`.
    pub fn args(&self, job: &DockingJob) -> Vec<String> {
        let mut args = vec![
            "--receptor".to_string(),
            job.receptor.display().to_string(),
            "--ligand".to_string(),
            job.ligand.display().to_string(),
        ];
        args.extend(job.search_box.args());
        args.push(format!("--exhaustiveness={}", job.exhaustiveness));
        args.push("--out".into());
        args.push(job.out.display().to_string());
        args.push("--num_modes".into());
        args.push(job.num_modes.to_string());
        args
    }

    /// Run AutoDock Vina for one ligand. Stdout goes to the score file even
    /// when Vina fails.
    pub async fn dock(&self, job: &DockingJob) -> Result<PathBuf> {
        info!("Running AutoDock Vina on {:?}", job.ligand);

        let program = self.executable_path.to_string_lossy();
        let output = run_tool(&program, self.args(job), None).await?;
        fs::write(&job.score_file, &output.stdout)?;
        output.into_result("vina")?;

        debug!("AutoDock Vina completed successfully. Output in {:?}", job.out);
        Ok(job.out.clone())
    }
}

/// Settings for docking every prepared ligand of a directory.
#[derive(Debug, Clone)]
pub struct BatchDockingConfig {
    pub vina_executable: PathBuf,
    pub ligands_dir: PathBuf,
    pub receptor: PathBuf,
    pub box_file: PathBuf,
    /// Pass the box file through `--config` instead of explicit coordinates.
    pub box_as_config: bool,
    pub exhaustiveness: u32,
    pub num_modes: u32,
    pub poses_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DockingOutcome {
    AllSucceeded,
    Partial,
    AllFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockingReport {
    pub ligand_count: usize,
    pub successful: Vec<String>,
    pub failed: Vec<String>,
    pub score_files: usize,
    pub pose_files: usize,
    pub poses_dir: PathBuf,
}

impl DockingReport {
    pub fn success_rate(&self) -> f64 {
        if self.ligand_count == 0 {
            0.0
        } else {
            self.successful.len() as f64 / self.ligand_count as f64 * 100.0
        }
    }

    pub fn outcome(&self) -> DockingOutcome {
        if self.successful.len() == self.ligand_count {
            DockingOutcome::AllSucceeded
        } else if !self.successful.is_empty() {
            DockingOutcome::Partial
        } else {
            DockingOutcome::AllFailed
        }
    }
}

/// Ligand number: the file name up to the first `-`.
pub fn ligand_number(file_name: &str) -> &str {
    file_name.split('-').next().unwrap_or(file_name)
}

fn files_with_suffix(dir: &Path, suffix: &str) -> Result<Vec<String>> {
    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(suffix))
        .collect();
    names.sort();
    Ok(names)
}

/// Dock every `*-prepared.pdbqt` in the ligands directory, one at a time.
pub async fn dock_all(config: &BatchDockingConfig) -> Result<DockingReport> {
    for required in [&config.receptor, &config.box_file, &config.ligands_dir] {
        if !required.exists() {
            return Err(LigscreenError::MissingInput(required.clone()));
        }
    }
    fs::create_dir_all(&config.poses_dir)?;

    let search_box = if config.box_as_config {
        SearchBox::ConfigFile(config.box_file.clone())
    } else {
        SearchBox::read_box_file(&config.box_file)?
    };

    let ligands = files_with_suffix(&config.ligands_dir, LIGAND_SUFFIX)?;
    if ligands.is_empty() {
        return Err(LigscreenError::MissingInput(config.ligands_dir.join(format!("*{LIGAND_SUFFIX}"))));
    }
    info!(count = ligands.len(), "Found ligand files, starting docking");

    let runner = VinaRunner::new(&config.vina_executable);
    let mut successful = Vec::new();
    let mut failed = Vec::new();

    for file in &ligands {
        let number = ligand_number(file).to_string();
        let job = DockingJob {
            receptor: config.receptor.clone(),
            ligand: config.ligands_dir.join(file),
            search_box: search_box.clone(),
            exhaustiveness: config.exhaustiveness,
            num_modes: config.num_modes,
            out: config.poses_dir.join(format!("{number}{POSE_SUFFIX}")),
            score_file: config.poses_dir.join(format!("{number}{SCORE_SUFFIX}")),
        };

        match runner.dock(&job).await {
            Ok(_) => {
                info!(ligand = %number, "Docking completed");
                successful.push(number);
            }
            Err(e @ LigscreenError::ToolNotFound { .. }) => {
                error!("{e}");
                return Err(e);
            }
            Err(e) => {
                warn!(ligand = %number, error = %e, "Docking failed");
                failed.push(number);
            }
        }
    }

    let report = DockingReport {
        ligand_count: ligands.len(),
        successful,
        failed,
        score_files: files_with_suffix(&config.poses_dir, SCORE_SUFFIX)?.len(),
        pose_files: files_with_suffix(&config.poses_dir, POSE_SUFFIX)?.len(),
        poses_dir: config.poses_dir.clone(),
    };
    info!(
        ligands = report.ligand_count,
        ok = report.successful.len(),
        failed = report.failed.len(),
        "Docking finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn job(search_box: SearchBox) -> DockingJob {
        DockingJob {
            receptor: PathBuf::from("receptor/r.pdbqt"),
            ligand: PathBuf::from("ligands/3-prepared.pdbqt"),
            search_box,
            exhaustiveness: 100,
            num_modes: 20,
            out: PathBuf::from("poses/3-vina-out.pdbqt"),
            score_file: PathBuf::from("poses/3-vina-score.txt"),
        }
    }

    #[test]
    fn test_args_with_config_file() {
        let runner = VinaRunner::new("vina");
        let args = runner.args(&job(SearchBox::ConfigFile(PathBuf::from("receptor/box.txt"))));
        assert_eq!(
            args,
            vec![
                "--receptor",
                "receptor/r.pdbqt",
                "--ligand",
                "ligands/3-prepared.pdbqt",
                "--config",
                "receptor/box.txt",
                "--exhaustiveness=100",
                "--out",
                "poses/3-vina-out.pdbqt",
                "--num_modes",
                "20",
            ]
        );
    }

    #[test]
    fn test_args_with_explicit_box() {
        let runner = VinaRunner::new("vina");
        let args = runner.args(&job(SearchBox::Explicit {
            center: [1.5, -2.0, 3.25],
            size: [20.0, 20.0, 22.5],
        }));
        let joined = args.join(" ");
        assert!(joined.contains("--center_x 1.5 --center_y -2 --center_z 3.25"));
        assert!(joined.contains("--size_x 20 --size_y 20 --size_z 22.5"));
    }

    #[test]
    fn test_read_box_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("box.txt");
        fs::write(
            &path,
            "center_x = 2.5\ncenter_y = -1.0\ncenter_z = 10\nsize_x = 18\nsize_y = 20\nsize_z = 22\nspacing = 0.375\n",
        )
        .unwrap();
        let parsed = SearchBox::read_box_file(&path).unwrap();
        assert_eq!(
            parsed,
            SearchBox::Explicit {
                center: [2.5, -1.0, 10.0],
                size: [18.0, 20.0, 22.0],
            }
        );
    }

    #[test]
    fn test_read_box_file_missing_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("box.txt");
        fs::write(&path, "center_x = 2.5\ncenter_y = 1\n").unwrap();
        let err = SearchBox::read_box_file(&path).unwrap_err();
        assert!(err.to_string().contains("center_z"));
    }

    #[test]
    fn test_ligand_number() {
        assert_eq!(ligand_number("12-prepared.pdbqt"), "12");
        assert_eq!(ligand_number("noprefix"), "noprefix");
    }

    #[test]
    fn test_outcome() {
        let mut report = DockingReport {
            ligand_count: 2,
            successful: vec!["0".into(), "1".into()],
            failed: vec![],
            score_files: 2,
            pose_files: 2,
            poses_dir: PathBuf::from("poses"),
        };
        assert_eq!(report.outcome(), DockingOutcome::AllSucceeded);
        assert_eq!(report.success_rate(), 100.0);
        report.failed = vec![report.successful.pop().unwrap()];
        assert_eq!(report.outcome(), DockingOutcome::Partial);
        report.failed.push(report.successful.pop().unwrap());
        assert_eq!(report.outcome(), DockingOutcome::AllFailed);
        assert_eq!(report.success_rate(), 0.0);
    }

    #[tokio::test]
    async fn test_dock_all_requires_inputs() {
        let dir = tempdir().unwrap();
        let config = BatchDockingConfig {
            vina_executable: PathBuf::from("vina"),
            ligands_dir: dir.path().join("ligands"),
            receptor: dir.path().join("receptor.pdbqt"),
            box_file: dir.path().join("box.txt"),
            box_as_config: true,
            exhaustiveness: 8,
            num_modes: 9,
            poses_dir: dir.path().join("poses"),
        };
        let err = dock_all(&config).await.unwrap_err();
        assert!(matches!(err, LigscreenError::MissingInput(p) if p.ends_with("receptor.pdbqt")));
    }
}

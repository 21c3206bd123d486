//! Boltz co-folding affinity predictions: per-ligand YAML inputs, sequential
//! `boltz predict` runs, and collection of the predicted affinities.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use ligscreen_common::{format_float, normalize_key, run_tool, stats, CsvTable, LigscreenError, Result};

use crate::ligand::ID_COLUMN;

pub const KCAL_COLUMN: &str = "boltz_affinity_kcalmol";
pub const PRED_COLUMN: &str = "avg_affinity_pred_value";
pub const PROB_COLUMN: &str = "avg_affinity_probability_binary";

const RESULTS_PREFIX: &str = "boltz_results_";

/// Convert a mean Boltz `affinity_pred_value` (log10 IC50 in uM) to kcal/mol.
pub fn pred_value_to_kcal(mean_pred: f64) -> f64 {
    (6.0 - mean_pred) * 1.364
}

/// The receptor and pocket every ligand is co-folded with.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSpec {
    pub protein_sequence: String,
    pub protein_chain: String,
    pub ligand_chain: String,
    pub pocket_residues: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoltzInput {
    pub version: u32,
    pub sequences: Vec<SequenceEntry>,
    pub properties: Vec<PropertyEntry>,
    pub constraints: Vec<ConstraintEntry>,
}

/// One item of `sequences`; exactly one field is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<ProteinChain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ligand: Option<LigandChain>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProteinChain {
    pub id: String,
    pub sequence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LigandChain {
    pub id: String,
    pub smiles: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyEntry {
    pub affinity: AffinityProperty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffinityProperty {
    pub binder: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintEntry {
    pub pocket: PocketConstraint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PocketConstraint {
    pub binder: String,
    /// `[chain, residue index]` pairs.
    pub contacts: Vec<(String, u32)>,
}

impl BoltzInput {
    pub fn for_ligand(target: &TargetSpec, smiles: &str) -> Self {
        let binder = target.ligand_chain.clone();
        Self {
            version: 1,
            sequences: vec![
                SequenceEntry {
                    protein: Some(ProteinChain {
                        id: target.protein_chain.clone(),
                        sequence: target.protein_sequence.clone(),
                    }),
                    ligand: None,
                },
                SequenceEntry {
                    protein: None,
                    ligand: Some(LigandChain {
                        id: binder.clone(),
                        smiles: smiles.to_string(),
                    }),
                },
            ],
            properties: vec![PropertyEntry {
                affinity: AffinityProperty {
                    binder: binder.clone(),
                },
            }],
            constraints: vec![ConstraintEntry {
                pocket: PocketConstraint {
                    binder,
                    contacts: target
                        .pocket_residues
                        .iter()
                        .map(|&r| (target.protein_chain.clone(), r))
                        .collect(),
                },
            }],
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Sampling settings passed to `boltz predict`.
#[derive(Debug, Clone)]
pub struct BoltzRunConfig {
    pub executable: String,
    pub target: TargetSpec,
    pub config_dir: PathBuf,
    pub results_dir: PathBuf,
    pub use_msa_server: bool,
    pub recycling_steps: u32,
    pub sampling_steps: u32,
    pub diffusion_samples: u32,
    pub step_scale: f64,
}

impl BoltzRunConfig {
    pub fn args(&self, yaml: &Path) -> Vec<String> {
        let mut args = vec!["predict".to_string(), yaml.display().to_string()];
        if self.use_msa_server {
            args.push("--use_msa_server".into());
        }
        args.extend([
            "--out_dir".to_string(),
            self.results_dir.display().to_string(),
            "--recycling_steps".to_string(),
            self.recycling_steps.to_string(),
            "--sampling_steps".to_string(),
            self.sampling_steps.to_string(),
            "--diffusion_samples".to_string(),
            self.diffusion_samples.to_string(),
            "--step_scale".to_string(),
            self.step_scale.to_string(),
        ]);
        args
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    pub attempted: usize,
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

/// Write one YAML input per ligand and run Boltz on each, in list order.
pub async fn predict_all(list_csv: &Path, config: &BoltzRunConfig) -> Result<PredictionReport> {
    let table = CsvTable::read(list_csv)?;
    let id_col = table.require_column(ID_COLUMN)?;
    let smiles_col = table.require_column("smiles")?;

    fs::create_dir_all(&config.config_dir)?;
    let mut report = PredictionReport::default();

    for row in 0..table.len() {
        let id = table.value(row, id_col).trim().to_string();
        let smiles = table.value(row, smiles_col).trim();
        info!(id = %id, "Processing ligand");

        let yaml_path = config.config_dir.join(format!("{id}.yaml"));
        fs::write(&yaml_path, BoltzInput::for_ligand(&config.target, smiles).to_yaml()?)?;
        debug!(path = %yaml_path.display(), "Created Boltz input");

        report.attempted += 1;
        match run_tool(&config.executable, config.args(&yaml_path), None).await {
            Ok(out) if out.success => {
                debug!(id = %id, stdout = %out.stdout.trim(), "Boltz finished");
                report.succeeded.push(id);
            }
            Ok(out) => {
                warn!(
                    id = %id,
                    code = ?out.status_code,
                    stdout = %out.stdout.trim(),
                    stderr = %out.stderr.trim(),
                    "Boltz prediction failed"
                );
                report.failed.push(id);
            }
            Err(e @ LigscreenError::ToolNotFound { .. }) => {
                error!("{e}");
                return Err(e);
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        attempted = report.attempted,
        failed = report.failed.len(),
        "Boltz predictions finished"
    );
    Ok(report)
}

/// Averaged affinity outputs of one Boltz run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoltzAffinity {
    pub mean_pred_value: f64,
    pub mean_probability_binary: f64,
    pub kcal_per_mol: f64,
}

#[derive(Debug, Deserialize)]
struct AffinityFile {
    affinity_pred_value: f64,
    affinity_pred_value1: f64,
    affinity_pred_value2: f64,
    affinity_probability_binary: f64,
    affinity_probability_binary1: f64,
    affinity_probability_binary2: f64,
}

impl From<AffinityFile> for BoltzAffinity {
    fn from(f: AffinityFile) -> Self {
        let mean_pred_value =
            (f.affinity_pred_value + f.affinity_pred_value1 + f.affinity_pred_value2) / 3.0;
        let mean_probability_binary = (f.affinity_probability_binary
            + f.affinity_probability_binary1
            + f.affinity_probability_binary2)
            / 3.0;
        Self {
            mean_pred_value,
            mean_probability_binary,
            kcal_per_mol: pred_value_to_kcal(mean_pred_value),
        }
    }
}

/// Parse an `affinity_<idx>.json` document.
pub fn parse_affinity_json(text: &str) -> Result<BoltzAffinity> {
    let file: AffinityFile = serde_json::from_str(text)?;
    Ok(file.into())
}

/// Affinities found under `results_dir`, keyed by ligand id, plus the number
/// of result folders that were missing or unreadable.
pub fn collect_affinities(results_dir: &Path) -> Result<(HashMap<String, BoltzAffinity>, usize)> {
    if !results_dir.is_dir() {
        return Err(LigscreenError::MissingInput(results_dir.to_path_buf()));
    }

    let mut folders: Vec<String> = fs::read_dir(results_dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with(RESULTS_PREFIX))
        .collect();
    folders.sort();

    let mut affinities = HashMap::new();
    let mut missing = 0usize;
    for folder in folders {
        let idx = &folder[RESULTS_PREFIX.len()..];
        let json_path = results_dir
            .join(&folder)
            .join("predictions")
            .join(idx)
            .join(format!("affinity_{idx}.json"));

        let text = match fs::read_to_string(&json_path) {
            Ok(t) => t,
            Err(_) => {
                warn!(path = %json_path.display(), "Missing affinity file");
                missing += 1;
                continue;
            }
        };
        match parse_affinity_json(&text) {
            Ok(affinity) => {
                info!(
                    folder = %folder,
                    kcal = %format!("{:.2}", affinity.kcal_per_mol),
                    pred = %format!("{:.3}", affinity.mean_pred_value),
                    prob = %format!("{:.3}", affinity.mean_probability_binary),
                    "Processed Boltz result"
                );
                affinities.insert(normalize_key(idx), affinity);
            }
            Err(e) => {
                warn!(path = %json_path.display(), error = %e, "Unusable affinity file");
                missing += 1;
            }
        }
    }

    Ok((affinities, missing))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KcalStats {
    pub mean: f64,
    /// Sample standard deviation; `None` with a single match.
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoltzSummary {
    pub processed: usize,
    pub missing: usize,
    pub matched: usize,
    pub total: usize,
    pub id_column: String,
    pub stats: Option<KcalStats>,
    pub output: PathBuf,
}

/// Add the three Boltz columns to `input_csv`, matching on its second column.
pub fn merge_boltz_affinities(input_csv: &Path, results_dir: &Path, output_csv: &Path) -> Result<BoltzSummary> {
    let mut table = CsvTable::read(input_csv)?;
    info!(path = %input_csv.display(), rows = table.len(), "Loaded CSV");

    let (affinities, missing) = collect_affinities(results_dir)?;
    info!(processed = affinities.len(), missing, "Collected Boltz results");

    if table.headers().len() < 2 {
        return Err(LigscreenError::MissingColumn("second (id) column".to_string()));
    }
    let id_col = 1;
    let id_column = table.headers()[id_col].clone();
    debug!(column = %id_column, "Matching on column");

    let column = |f: fn(&BoltzAffinity) -> f64| -> HashMap<String, String> {
        affinities
            .iter()
            .map(|(k, a)| (k.clone(), format_float(f(a))))
            .collect()
    };
    let matched = table.map_column(id_col, KCAL_COLUMN, &column(|a| a.kcal_per_mol))?;
    table.map_column(id_col, PRED_COLUMN, &column(|a| a.mean_pred_value))?;
    table.map_column(id_col, PROB_COLUMN, &column(|a| a.mean_probability_binary))?;
    info!(matched, total = table.len(), "Matched rows with Boltz results");

    table.write(output_csv)?;
    info!(path = %output_csv.display(), "New CSV saved");

    let kcal_col = table.require_column(KCAL_COLUMN)?;
    let values: Vec<f64> = table.column_f64(kcal_col).into_iter().flatten().collect();
    let stats = match (stats::mean(&values), stats::min(&values), stats::max(&values)) {
        (Some(mean), Some(min), Some(max)) => Some(KcalStats {
            mean,
            std: stats::sample_std(&values),
            min,
            max,
        }),
        _ => None,
    };

    Ok(BoltzSummary {
        processed: affinities.len(),
        missing,
        matched,
        total: table.len(),
        id_column,
        stats,
        output: output_csv.to_path_buf(),
    })
}

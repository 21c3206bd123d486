//! Configuration loading for ligscreen.
//! Reads ligscreen.toml from `--config`, the LIGSCREEN_CONFIG env var, or the
//! current directory. Every key has a default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

pub const DEFAULT_CONFIG_FILE: &str = "ligscreen.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub ligands: LigandsConfig,
    #[serde(default)]
    pub docking: DockingConfig,
    #[serde(default)]
    pub boltz: BoltzConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub descriptors: DescriptorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default = "default_workspace_path")]
    pub path: PathBuf,
}

fn default_workspace_path() -> PathBuf { PathBuf::from(".") }

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self { path: default_workspace_path() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LigandsConfig {
    #[serde(default = "default_ligands_dir")]
    pub dir: String,
    #[serde(default = "default_source_prefix")]
    pub source_prefix: String,
    #[serde(default = "default_list_file")]
    pub list_file: String,
    #[serde(default = "default_scrub")]
    pub scrub_executable: String,
    #[serde(default = "default_mk_prepare")]
    pub mk_prepare_executable: String,
    #[serde(default = "default_max_consecutive_empty")]
    pub max_consecutive_empty: usize,
}

fn default_ligands_dir()           -> String { "Autodock-Vina/ligands".to_string() }
fn default_source_prefix()         -> String { "cheese".to_string() }
fn default_list_file()             -> String { "list.csv".to_string() }
fn default_scrub()                 -> String { "scrub.py".to_string() }
fn default_mk_prepare()            -> String { "mk_prepare_ligand.py".to_string() }
fn default_max_consecutive_empty() -> usize  { 5 }

impl Default for LigandsConfig {
    fn default() -> Self {
        Self {
            dir: default_ligands_dir(),
            source_prefix: default_source_prefix(),
            list_file: default_list_file(),
            scrub_executable: default_scrub(),
            mk_prepare_executable: default_mk_prepare(),
            max_consecutive_empty: default_max_consecutive_empty(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockingConfig {
    #[serde(default = "default_vina")]
    pub vina_executable: String,
    #[serde(default = "default_receptor_dir")]
    pub receptor_dir: String,
    #[serde(default = "default_receptor_name")]
    pub receptor_name: String,
    #[serde(default = "default_box_file")]
    pub box_file: String,
    /// Hand the box file to Vina as `--config` instead of explicit coordinates.
    #[serde(default = "bool_true")]
    pub box_as_config: bool,
    #[serde(default = "default_exhaustiveness")]
    pub exhaustiveness: u32,
    #[serde(default = "default_num_modes")]
    pub num_modes: u32,
    #[serde(default = "default_poses_dir")]
    pub poses_dir: String,
    /// Written inside `poses_dir`.
    #[serde(default = "default_affinities_file")]
    pub affinities_file: String,
}

fn default_vina()            -> String { "vina".to_string() }
fn default_receptor_dir()    -> String { "Autodock-Vina/receptor".to_string() }
fn default_receptor_name()   -> String { "1H1Q-prepared.pdbqt".to_string() }
fn default_box_file()        -> String { "1H1Q-prepared.box.txt".to_string() }
fn default_exhaustiveness()  -> u32    { 100 }
fn default_num_modes()       -> u32    { 20 }
fn default_poses_dir()       -> String { "Autodock-Vina/poses".to_string() }
fn default_affinities_file() -> String { "list_with_affinities.csv".to_string() }

fn bool_true() -> bool { true }

impl Default for DockingConfig {
    fn default() -> Self {
        Self {
            vina_executable: default_vina(),
            receptor_dir: default_receptor_dir(),
            receptor_name: default_receptor_name(),
            box_file: default_box_file(),
            box_as_config: true,
            exhaustiveness: default_exhaustiveness(),
            num_modes: default_num_modes(),
            poses_dir: default_poses_dir(),
            affinities_file: default_affinities_file(),
        }
    }
}

/// CDK2 construct used for co-folding.
pub const CDK2_SEQUENCE: &str = "GPLGSMENFQKVEKIGEGTYGVVYKARNKLTGEVVALKKIRLDTETEGVPSTAIREISLLKELNHPNIVKLLDVIHTENKLYLVFEFLHQDLKKFMDASALTGIPLPLIKSYLFQLLQGLAFCHSHRVLHRDLKPQNLLINTEGAIKLADFGLARAFGVPVRTYTHEVVTLWYRAPEILLGCKYYSTAVDIWSLGCIFAEMVTRRALFPGDSEIDQLFRIFRTLGTPDEVVWPGVTSMPDYKPSFPKWARQDFSKVVPPLDEDGRSLLSQMLHYDPNKRISAKAALAHPFFQDVTKPVPHLRL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoltzConfig {
    #[serde(default = "default_boltz")]
    pub executable: String,
    #[serde(default = "default_protein_sequence")]
    pub protein_sequence: String,
    #[serde(default = "default_protein_chain")]
    pub protein_chain: String,
    #[serde(default = "default_ligand_chain")]
    pub ligand_chain: String,
    #[serde(default = "default_pocket_residues")]
    pub pocket_residues: Vec<u32>,
    #[serde(default = "default_boltz_config_dir")]
    pub config_dir: String,
    #[serde(default = "default_boltz_results_dir")]
    pub results_dir: String,
    #[serde(default = "bool_true")]
    pub use_msa_server: bool,
    #[serde(default = "default_recycling_steps")]
    pub recycling_steps: u32,
    #[serde(default = "default_sampling_steps")]
    pub sampling_steps: u32,
    #[serde(default = "default_diffusion_samples")]
    pub diffusion_samples: u32,
    #[serde(default = "default_step_scale")]
    pub step_scale: f64,
    #[serde(default = "default_boltz_output")]
    pub output_file: String,
}

fn default_boltz()             -> String   { "boltz".to_string() }
fn default_protein_sequence()  -> String   { CDK2_SEQUENCE.to_string() }
fn default_protein_chain()     -> String   { "A".to_string() }
fn default_ligand_chain()      -> String   { "B".to_string() }
fn default_pocket_residues()   -> Vec<u32> { vec![83, 134] }
fn default_boltz_config_dir()  -> String   { "boltz/boltz-configurations-files".to_string() }
fn default_boltz_results_dir() -> String   { "boltz/boltz-results".to_string() }
fn default_recycling_steps()   -> u32      { 1 }
fn default_sampling_steps()    -> u32      { 50 }
fn default_diffusion_samples() -> u32      { 3 }
fn default_step_scale()        -> f64      { 1.2 }
fn default_boltz_output()      -> String   { "boltz/list_with_affinities_boltz.csv".to_string() }

impl Default for BoltzConfig {
    fn default() -> Self {
        Self {
            executable: default_boltz(),
            protein_sequence: default_protein_sequence(),
            protein_chain: default_protein_chain(),
            ligand_chain: default_ligand_chain(),
            pocket_residues: default_pocket_residues(),
            config_dir: default_boltz_config_dir(),
            results_dir: default_boltz_results_dir(),
            use_msa_server: true,
            recycling_steps: default_recycling_steps(),
            sampling_steps: default_sampling_steps(),
            diffusion_samples: default_diffusion_samples(),
            step_scale: default_step_scale(),
            output_file: default_boltz_output(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_sorted_file")]
    pub sorted_file: String,
    #[serde(default = "default_best_file")]
    pub best_file: String,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_sorted_file() -> String { "list-sorted.csv".to_string() }
fn default_best_file()   -> String { "list-best10.csv".to_string() }
fn default_top_n()       -> usize  { 10 }

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            sorted_file: default_sorted_file(),
            best_file: default_best_file(),
            top_n: default_top_n(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptorsConfig {
    #[serde(default = "default_candidates_file")]
    pub candidates_file: String,
}

fn default_candidates_file() -> String { "candidates.csv".to_string() }

impl Default for DescriptorsConfig {
    fn default() -> Self {
        Self { candidates_file: default_candidates_file() }
    }
}


impl Config {
    /// Load configuration.
    ///
    /// An explicitly requested file (`--config` or LIGSCREEN_CONFIG) must exist;
    /// a missing ./ligscreen.toml falls back to the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(p) => {
                if !p.exists() {
                    anyhow::bail!(
                        "No ligscreen configuration at {}.\n\
                         Point --config or LIGSCREEN_CONFIG at an existing file; \
                         ligscreen.example.toml lists every key with its default.",
                        p.display()
                    );
                }
                p.to_path_buf()
            }
            None => {
                let p = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !p.exists() {
                    warn!("{DEFAULT_CONFIG_FILE} not found, using built-in defaults");
                    return Ok(Config::default());
                }
                p
            }
        };

        let content = std::fs::read_to_string(&path)?;
        let config = Self::from_toml(&content)?;
        info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve a configured path against the workspace directory.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.workspace.path.join(relative)
    }

    pub fn ligands_dir(&self) -> PathBuf {
        self.resolve(&self.ligands.dir)
    }

    pub fn ligand_list(&self) -> PathBuf {
        self.ligands_dir().join(&self.ligands.list_file)
    }

    pub fn receptor_dir(&self) -> PathBuf {
        self.resolve(&self.docking.receptor_dir)
    }

    pub fn poses_dir(&self) -> PathBuf {
        self.resolve(&self.docking.poses_dir)
    }

    pub fn vina_affinities(&self) -> PathBuf {
        self.poses_dir().join(&self.docking.affinities_file)
    }

    pub fn boltz_output(&self) -> PathBuf {
        self.resolve(&self.boltz.output_file)
    }

    pub fn sorted_list(&self) -> PathBuf {
        self.resolve(&self.ranking.sorted_file)
    }

    pub fn best_list(&self) -> PathBuf {
        self.resolve(&self.ranking.best_file)
    }

    pub fn candidates(&self) -> PathBuf {
        self.resolve(&self.descriptors.candidates_file)
    }
}

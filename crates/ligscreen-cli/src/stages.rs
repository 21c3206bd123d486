//! Stage runners: map the configuration onto each library stage and print its
//! report.

use anyhow::{bail, Context};
use tracing::info;

use ligscreen_molecules::boltz::{self, BoltzRunConfig, TargetSpec};
use ligscreen_molecules::docking::{self, BatchDockingConfig};
use ligscreen_molecules::ligand::{self, PreparationConfig};
use ligscreen_molecules::profile::profile_candidates;
use ligscreen_molecules::vina_scores;

use crate::config::Config;
use crate::report;

pub async fn prepare_ligands(config: &Config) -> anyhow::Result<()> {
    let dir = config.ligands_dir();
    let numbered = ligand::add_id_column(&dir, &config.ligands.source_prefix, &config.ligands.list_file)?;
    if numbered.is_none() {
        bail!(
            "No {}*.csv file found in {}. Cannot proceed with ligand preparation.",
            config.ligands.source_prefix,
            dir.display()
        );
    }

    let report = ligand::prepare_ligands(&PreparationConfig {
        dir,
        list_file: config.ligands.list_file.clone(),
        scrub_executable: config.ligands.scrub_executable.clone(),
        mk_prepare_executable: config.ligands.mk_prepare_executable.clone(),
        max_consecutive_empty: config.ligands.max_consecutive_empty,
    })
    .await?;
    report::preparation(&report);
    Ok(())
}

pub async fn dock(config: &Config) -> anyhow::Result<()> {
    let receptor_dir = config.receptor_dir();
    let report = docking::dock_all(&BatchDockingConfig {
        vina_executable: config.docking.vina_executable.clone().into(),
        ligands_dir: config.ligands_dir(),
        receptor: receptor_dir.join(&config.docking.receptor_name),
        box_file: receptor_dir.join(&config.docking.box_file),
        box_as_config: config.docking.box_as_config,
        exhaustiveness: config.docking.exhaustiveness,
        num_modes: config.docking.num_modes,
        poses_dir: config.poses_dir(),
    })
    .await?;
    report::docking(&report);
    Ok(())
}

pub fn collect_vina(config: &Config) -> anyhow::Result<()> {
    let list = config.ligand_list();
    info!(path = %list.display(), "Reading ligands data");
    let summary = vina_scores::merge_vina_affinities(
        &list,
        &config.poses_dir(),
        Some(config.workspace.path.as_path()),
        &config.vina_affinities(),
    )
    .with_context(|| format!("collecting Vina scores for {}", list.display()))?;
    report::vina(&summary);
    Ok(())
}

fn boltz_run_config(config: &Config) -> BoltzRunConfig {
    let b = &config.boltz;
    BoltzRunConfig {
        executable: b.executable.clone(),
        target: TargetSpec {
            protein_sequence: b.protein_sequence.clone(),
            protein_chain: b.protein_chain.clone(),
            ligand_chain: b.ligand_chain.clone(),
            pocket_residues: b.pocket_residues.clone(),
        },
        config_dir: config.resolve(&b.config_dir),
        results_dir: config.resolve(&b.results_dir),
        use_msa_server: b.use_msa_server,
        recycling_steps: b.recycling_steps,
        sampling_steps: b.sampling_steps,
        diffusion_samples: b.diffusion_samples,
        step_scale: b.step_scale,
    }
}

pub async fn boltz_predict(config: &Config) -> anyhow::Result<()> {
    let report = boltz::predict_all(&config.ligand_list(), &boltz_run_config(config)).await?;
    report::boltz_predictions(&report);
    Ok(())
}

pub fn collect_boltz(config: &Config) -> anyhow::Result<()> {
    let summary = boltz::merge_boltz_affinities(
        &config.vina_affinities(),
        &config.resolve(&config.boltz.results_dir),
        &config.boltz_output(),
    )?;
    report::boltz(&summary);
    Ok(())
}

pub fn rank(config: &Config) -> anyhow::Result<()> {
    let sorted = config.sorted_list();
    let best = config.best_list();
    let ranking = ligscreen_ranker::rank_files(&config.boltz_output(), &sorted, &best, config.ranking.top_n)?;
    report::ranking(&ranking, &sorted, &best);
    Ok(())
}

pub fn profile(config: &Config) -> anyhow::Result<()> {
    let summary = profile_candidates(&config.best_list(), &config.candidates())?;
    report::candidates(&summary);
    Ok(())
}

/// Every stage in pipeline order, stopping at the first error.
pub async fn run_all(config: &Config) -> anyhow::Result<()> {
    prepare_ligands(config).await.context("ligand preparation")?;
    dock(config).await.context("docking")?;
    collect_vina(config).context("Vina score collection")?;
    boltz_predict(config).await.context("Boltz prediction")?;
    collect_boltz(config).context("Boltz collection")?;
    rank(config).context("ranking")?;
    profile(config).context("candidate profiling")?;
    Ok(())
}

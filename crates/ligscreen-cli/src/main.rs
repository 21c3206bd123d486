//! ligscreen: kinase ligand virtual-screening pipeline.
//! Entry point for the command-line binary.

mod config;
mod report;
mod stages;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ligscreen", version)]
#[command(about = "Dock, co-fold, rank and profile candidate kinase ligands", long_about = None)]
struct Cli {
    /// Config TOML file
    #[arg(short, long, global = true, env = "LIGSCREEN_CONFIG")]
    config: Option<PathBuf>,

    /// Workspace directory that relative paths resolve against
    #[arg(short, long, global = true, value_name = "DIR")]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Number the source ligand list and convert each SMILES to PDBQT
    PrepareLigands,
    /// Dock every prepared ligand against the receptor with AutoDock Vina
    Dock,
    /// Merge the best Vina affinity of each ligand into the ligand list
    CollectVina,
    /// Write Boltz inputs and run an affinity prediction per ligand
    BoltzPredict,
    /// Merge the Boltz affinity predictions into the Vina table
    CollectBoltz,
    /// Compute the combined score and write the sorted and top lists
    Rank,
    /// Compute descriptors, drug-likeness and ADMET estimates for the top list
    Profile,
    /// Run every stage in order, stopping at the first failure
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ligscreen=info,warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = config::Config::load(cli.config.as_deref())?;
    if let Some(workspace) = cli.workspace {
        config.workspace.path = workspace;
    }
    info!(workspace = %config.workspace.path.display(), "ligscreen {}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::PrepareLigands => stages::prepare_ligands(&config).await,
        Command::Dock => stages::dock(&config).await,
        Command::CollectVina => stages::collect_vina(&config),
        Command::BoltzPredict => stages::boltz_predict(&config).await,
        Command::CollectBoltz => stages::collect_boltz(&config),
        Command::Rank => stages::rank(&config),
        Command::Profile => stages::profile(&config),
        Command::Run => stages::run_all(&config).await,
    }
}

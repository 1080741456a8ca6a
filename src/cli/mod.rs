pub mod check;
pub mod plan;
pub mod run;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::config::settings::Settings;
use crate::utils::paths;

#[derive(Parser)]
#[command(name = "foldrun")]
#[command(version)]
#[command(about = "Singularity launch manager for the AlphaFold pipeline", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fold one or more FASTA targets in the AlphaFold container
    Run(run::RunArgs),

    /// Show the bind mounts and arguments a run would use, without running
    Plan(plan::PlanArgs),

    /// Verify the runtime, image, databases and GPU setup
    Check(check::CheckArgs),

    /// Create ~/.foldrun/settings.yaml with default values
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run(args) => args.execute().await,
            Commands::Plan(args) => args.execute().await,
            Commands::Check(args) => args.execute().await,
            Commands::Init { force } => init_settings(force),
        }
    }
}

fn init_settings(force: bool) -> Result<()> {
    let settings_path = paths::get_settings_file()?;

    if settings_path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            settings_path.display()
        );
    }

    Settings::template().save()?;

    println!("{} Created {}", "✓".green().bold(), settings_path.display());
    println!("\nNext steps:");
    println!("  1. Edit the settings file to point at your data_dir and alphafold_dir");
    println!("  2. Run {} to verify the setup", "foldrun check".cyan());

    Ok(())
}

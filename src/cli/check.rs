use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::config::databases;
use crate::config::presets::{DbPreset, ModelPreset};
use crate::config::settings::Settings;
use crate::singularity::client::SingularityClient;
use crate::singularity::gpu;
use crate::utils::paths;

#[derive(Args)]
pub struct CheckArgs {
    /// Directory of AlphaFold parameters and genetic/template databases
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Model preset whose database set is verified
    #[arg(long, value_enum, default_value = "monomer")]
    pub model_preset: ModelPreset,

    /// MSA database preset whose database set is verified
    #[arg(long, value_enum, default_value = "full_dbs")]
    pub db_preset: DbPreset,

    /// AlphaFold installation directory (holds alphafold.sif)
    #[arg(long, value_name = "DIR", env = "ALPHAFOLD_DIR")]
    pub alphafold_dir: Option<PathBuf>,

    /// Singularity image to verify (defaults to <alphafold-dir>/alphafold.sif)
    #[arg(long, value_name = "SIF")]
    pub image: Option<PathBuf>,
}

impl CheckArgs {
    pub async fn execute(self) -> Result<()> {
        let settings = Settings::load()?;
        let mut ok = true;

        match SingularityClient::new() {
            Ok(client) => {
                let version = client
                    .version()
                    .await
                    .unwrap_or_else(|_| "unknown version".to_string());
                println!(
                    "{} Runtime: {} ({})",
                    "✓".green().bold(),
                    client.binary().display(),
                    version
                );
            }
            Err(e) => {
                ok = false;
                println!("{} Runtime: {}", "✗".red().bold(), e);
            }
        }

        match self.resolve_image(&settings) {
            Some(path) if path.exists() => {
                println!("{} Image: {}", "✓".green().bold(), path.display());
            }
            Some(path) => {
                ok = false;
                println!("{} Image not found: {}", "✗".red().bold(), path.display());
            }
            None => {
                ok = false;
                println!(
                    "{} Image: not configured (--image, ALPHAFOLD_DIR, or settings)",
                    "✗".red().bold()
                );
            }
        }

        match self.data_dir.clone().or_else(|| settings.data_dir.clone()) {
            Some(data_dir) => {
                let data_dir = paths::absolute(&data_dir)?;
                println!(
                    "\n{} ({}, {})",
                    "Databases".bold(),
                    self.model_preset,
                    self.db_preset
                );
                for entry in
                    databases::database_paths(&data_dir, self.model_preset, self.db_preset)
                {
                    if entry.path.exists() {
                        println!(
                            "  {} {:<28} {}",
                            "✓".green().bold(),
                            entry.name,
                            entry.path.display()
                        );
                    } else {
                        ok = false;
                        println!(
                            "  {} {:<28} {}",
                            "✗".red().bold(),
                            entry.name,
                            entry.path.display()
                        );
                    }
                }
            }
            None => {
                println!(
                    "{} No data directory configured; database checks skipped",
                    "!".yellow().bold()
                );
            }
        }

        match gpu::requested_gpus().await {
            Ok(0) => println!(
                "{} No GPUs visible; run with --use-gpu=false",
                "!".yellow().bold()
            ),
            Ok(1) => println!("{} 1 GPU available", "✓".green().bold()),
            Ok(n) => {
                ok = false;
                println!(
                    "{} {} GPUs visible; the relaxation stage supports at most one",
                    "✗".red().bold(),
                    n
                );
            }
            Err(_) => println!(
                "{} GPU detection unavailable (no Slurm allocation, no nvidia-smi)",
                "!".yellow().bold()
            ),
        }

        if !ok {
            std::process::exit(1);
        }

        Ok(())
    }

    fn resolve_image(&self, settings: &Settings) -> Option<PathBuf> {
        self.image
            .clone()
            .or_else(|| settings.image.clone())
            .or_else(|| {
                self.alphafold_dir
                    .clone()
                    .or_else(|| settings.alphafold_dir.clone())
                    .map(|dir| dir.join("alphafold.sif"))
            })
    }
}

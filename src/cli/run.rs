use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Args};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::presets::{DbPreset, ModelPreset};
use crate::config::settings::Settings;
use crate::launch::plan::{self, LaunchParams};
use crate::singularity::client::SingularityClient;
use crate::singularity::config::RunConfig;
use crate::singularity::gpu;
use crate::utils::paths;

#[derive(Args)]
pub struct RunArgs {
    /// FASTA files (comma-separated), each a prediction target folded one
    /// after another. A file with multiple sequences is folded as a
    /// multimer. Basenames must be unique; they name the per-target
    /// output directories.
    #[arg(long, value_name = "PATHS", value_delimiter = ',', required = true)]
    pub fasta_paths: Vec<PathBuf>,

    /// Directory of AlphaFold parameters and genetic/template databases
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Maximum template release date to consider (ISO-8601: YYYY-MM-DD)
    #[arg(long, value_name = "DATE", value_parser = parse_template_date)]
    pub max_template_date: NaiveDate,

    /// Model configuration preset
    #[arg(long, value_enum, default_value = "monomer")]
    pub model_preset: ModelPreset,

    /// MSA database configuration preset
    #[arg(long, value_enum, default_value = "full_dbs")]
    pub db_preset: DbPreset,

    /// Directory that will store the results (defaults to $TMP, then
    /// $TMPDIR, then a fresh directory under /tmp)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Enable the NVIDIA runtime to run with GPUs
    #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set)]
    pub use_gpu: bool,

    /// Comma-separated device list exported as NVIDIA_VISIBLE_DEVICES
    #[arg(long, value_name = "LIST", default_value = "all")]
    pub gpu_devices: String,

    /// Run the final relaxation step on the predicted models. Turning
    /// this off may leave distracting stereochemical violations.
    #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set)]
    pub run_relax: bool,

    /// Run relaxation on GPU when the GPU is enabled
    #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set)]
    pub enable_gpu_relax: bool,

    /// Repeat JAX model evaluations to obtain a timing that excludes
    /// compilation
    #[arg(long)]
    pub benchmark: bool,

    /// Reuse MSAs already written to the output directory instead of
    /// running the MSA tools
    #[arg(long)]
    pub use_precomputed_msas: bool,

    /// Predictions (each with a different random seed) per multimer model
    #[arg(long, value_name = "N", default_value_t = 5)]
    pub num_multimer_predictions_per_model: u32,

    /// AlphaFold installation directory (holds alphafold.sif)
    #[arg(long, value_name = "DIR", env = "ALPHAFOLD_DIR")]
    pub alphafold_dir: Option<PathBuf>,

    /// Singularity image to run (defaults to <alphafold-dir>/alphafold.sif)
    #[arg(long, value_name = "SIF")]
    pub image: Option<PathBuf>,

    /// CPU threads for the OpenMM relaxation stage
    #[arg(long, value_name = "N")]
    pub openmm_cpu_threads: Option<u32>,
}

fn parse_template_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{value}': expected ISO-8601 (YYYY-MM-DD)"))
}

impl RunArgs {
    pub async fn execute(self) -> Result<()> {
        let settings = Settings::load()?;
        let image = self.resolve_image(&settings)?;
        let params = self.resolve(&settings)?;

        if params.use_gpu {
            let ngpus = gpu::requested_gpus().await?;
            // Amber relaxation fails with more than one visible device.
            if ngpus > 1 {
                anyhow::bail!("{ngpus} GPUs requested; the relaxation stage supports at most one");
            }
        }

        let plan = plan::build(&params)?;

        println!("{} Launching AlphaFold...", "=>".blue().bold());
        println!("  {} Image: {}", "•".yellow(), image.display());
        if params.use_gpu {
            println!("  {} GPU passthrough enabled (--nv)", "•".yellow());
        }
        for bind in plan.binds.iter() {
            println!(
                "  {} Mount: {} -> {}",
                "•".yellow(),
                bind.source.display(),
                bind.target.display()
            );
        }

        let client = SingularityClient::new()?;
        let config = RunConfig {
            image,
            app_args: plan.app_args,
            bind_spec: plan.binds.render(),
            env_vars: plan
                .env
                .iter()
                .map(|var| (var.name.clone(), var.value.clone()))
                .collect(),
            nv: plan.nv,
        };

        let exit_code = client.run(&config).await?;
        if exit_code == 0 {
            println!("{} AlphaFold run completed", "✓".green().bold());
        } else {
            println!(
                "{} AlphaFold exited with code {}",
                "✗".red().bold(),
                exit_code
            );
            std::process::exit(exit_code);
        }

        Ok(())
    }

    /// Resolve flags, environment and settings into concrete launch
    /// parameters. Flags win over settings.
    pub(crate) fn resolve(&self, settings: &Settings) -> Result<LaunchParams> {
        let data_dir = self
            .data_dir
            .clone()
            .or_else(|| settings.data_dir.clone())
            .context("No data directory: pass --data-dir or set data_dir in settings")?;
        let data_dir = paths::absolute(&data_dir)?;

        // Image builds copy the AlphaFold tree; databases under it would
        // be copied along with it.
        if let Some(dir) = self.resolve_alphafold_dir(settings) {
            let dir = paths::absolute(&dir)?;
            if data_dir.starts_with(&dir) {
                anyhow::bail!(
                    "The download directory {} must not be inside the AlphaFold directory {}",
                    data_dir.display(),
                    dir.display()
                );
            }
        }

        let mut fasta_paths = Vec::with_capacity(self.fasta_paths.len());
        for path in &self.fasta_paths {
            fasta_paths.push(paths::absolute(path)?);
        }

        let output_dir = match &self.output_dir {
            Some(dir) => paths::absolute(dir)?,
            None => paths::default_output_dir()?,
        };

        Ok(LaunchParams {
            fasta_paths,
            data_dir,
            output_dir,
            max_template_date: self.max_template_date,
            model_preset: self.model_preset,
            db_preset: self.db_preset,
            benchmark: self.benchmark,
            use_precomputed_msas: self.use_precomputed_msas,
            num_multimer_predictions_per_model: self.num_multimer_predictions_per_model,
            run_relax: self.run_relax,
            enable_gpu_relax: self.enable_gpu_relax,
            use_gpu: self.use_gpu,
            gpu_devices: self.gpu_devices.clone(),
            openmm_cpu_threads: self
                .openmm_cpu_threads
                .or(settings.openmm_cpu_threads)
                .unwrap_or(12),
        })
    }

    fn resolve_alphafold_dir(&self, settings: &Settings) -> Option<PathBuf> {
        self.alphafold_dir
            .clone()
            .or_else(|| settings.alphafold_dir.clone())
    }

    fn resolve_image(&self, settings: &Settings) -> Result<PathBuf> {
        if let Some(image) = self.image.clone().or_else(|| settings.image.clone()) {
            return paths::absolute(&image);
        }
        let dir = self.resolve_alphafold_dir(settings).context(
            "No image: pass --image, set ALPHAFOLD_DIR, or configure alphafold_dir in settings",
        )?;
        paths::absolute(&dir.join("alphafold.sif"))
    }
}

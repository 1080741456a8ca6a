//! Assembly of the container invocation: bind mounts, the wrapped
//! application's argument list, and the container environment.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::databases;
use crate::config::presets::{DbPreset, ModelPreset};
use crate::launch::binds::{BindSet, MOUNT_ROOT};

/// Launch inputs, already resolved to absolute paths and final values.
pub struct LaunchParams {
    pub fasta_paths: Vec<PathBuf>,
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub max_template_date: NaiveDate,
    pub model_preset: ModelPreset,
    pub db_preset: DbPreset,
    pub benchmark: bool,
    pub use_precomputed_msas: bool,
    pub num_multimer_predictions_per_model: u32,
    pub run_relax: bool,
    pub enable_gpu_relax: bool,
    pub use_gpu: bool,
    pub gpu_devices: String,
    pub openmm_cpu_threads: u32,
}

/// Environment variable exported into the container.
#[derive(Debug, Clone, Serialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

/// Everything `singularity run` needs for one launch.
#[derive(Debug, Serialize)]
pub struct LaunchPlan {
    pub binds: BindSet,
    pub app_args: Vec<String>,
    pub env: Vec<EnvVar>,
    pub nv: bool,
}

pub fn build(params: &LaunchParams) -> Result<LaunchPlan> {
    let mut binds = BindSet::new();
    let mut app_args = Vec::new();

    // Basenames name the per-target output directories; a clash would
    // make two targets write to the same place.
    let mut basenames = HashSet::new();
    for path in &params.fasta_paths {
        let name = path
            .file_name()
            .with_context(|| format!("FASTA path has no file name: {}", path.display()))?;
        if !basenames.insert(name.to_os_string()) {
            anyhow::bail!(
                "Duplicate FASTA basename {:?}: every FASTA path must have a unique basename",
                name
            );
        }
    }

    // Mount each FASTA under its own target directory.
    let mut target_fasta_paths = Vec::new();
    for (i, path) in params.fasta_paths.iter().enumerate() {
        let target = binds.add_file(&format!("fasta_path_{i}"), path)?;
        target_fasta_paths.push(target.display().to_string());
    }
    app_args.push(format!("--fasta_paths={}", target_fasta_paths.join(",")));

    for entry in
        databases::database_paths(&params.data_dir, params.model_preset, params.db_preset)
    {
        let target = if entry.name == "data_dir" {
            binds.add_dir(entry.name, &entry.path)?
        } else {
            binds.add_file(entry.name, &entry.path)?
        };
        app_args.push(format!("--{}={}", entry.name, target.display()));
    }

    let output_target = Path::new(MOUNT_ROOT).join("output");
    binds.add_at(&params.output_dir, &output_target)?;
    // The container's /tmp is the output directory as well.
    binds.add_at(&params.output_dir, Path::new("/tmp"))?;

    let use_gpu_relax = params.enable_gpu_relax && params.use_gpu;

    app_args.extend([
        format!("--output_dir={}", output_target.display()),
        format!(
            "--max_template_date={}",
            params.max_template_date.format("%Y-%m-%d")
        ),
        format!("--db_preset={}", params.db_preset.as_str()),
        format!("--model_preset={}", params.model_preset.as_str()),
        format!("--benchmark={}", params.benchmark),
        format!("--use_precomputed_msas={}", params.use_precomputed_msas),
        format!(
            "--num_multimer_predictions_per_model={}",
            params.num_multimer_predictions_per_model
        ),
        format!("--run_relax={}", params.run_relax),
        format!("--use_gpu_relax={use_gpu_relax}"),
        "--logtostderr".to_string(),
    ]);

    let mut env = vec![
        EnvVar::new("OPENMM_CPU_THREADS", params.openmm_cpu_threads.to_string()),
        // Unified memory lets predictions exceed a single device's RAM.
        EnvVar::new("TF_FORCE_UNIFIED_MEMORY", "1"),
        EnvVar::new("XLA_PYTHON_CLIENT_MEM_FRACTION", "4.0"),
    ];
    if params.use_gpu {
        env.push(EnvVar::new(
            "NVIDIA_VISIBLE_DEVICES",
            params.gpu_devices.clone(),
        ));
    }

    Ok(LaunchPlan {
        binds,
        app_args,
        env,
        nv: params.use_gpu,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_params() -> LaunchParams {
        LaunchParams {
            fasta_paths: vec![PathBuf::from("/home/user/t1.fasta")],
            data_dir: PathBuf::from("/db"),
            output_dir: PathBuf::from("/scratch/out"),
            max_template_date: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            model_preset: ModelPreset::Monomer,
            db_preset: DbPreset::FullDbs,
            benchmark: false,
            use_precomputed_msas: false,
            num_multimer_predictions_per_model: 5,
            run_relax: true,
            enable_gpu_relax: true,
            use_gpu: true,
            gpu_devices: "all".to_string(),
            openmm_cpu_threads: 12,
        }
    }

    #[test]
    fn monomer_full_dbs_plan() {
        let plan = build(&base_params()).unwrap();

        assert_eq!(
            plan.app_args[0],
            "--fasta_paths=/mnt/fasta_path_0/t1.fasta"
        );
        assert!(plan
            .app_args
            .contains(&"--data_dir=/mnt/data_dir".to_string()));
        assert!(plan
            .app_args
            .contains(&"--pdb70_database_path=/mnt/pdb70_database_path/pdb70".to_string()));
        assert!(plan.app_args.contains(
            &"--uniref30_database_path=/mnt/uniref30_database_path/UniRef30_2021_03".to_string()
        ));
        assert!(plan
            .app_args
            .contains(&"--template_mmcif_dir=/mnt/template_mmcif_dir/mmcif_files".to_string()));
        assert!(plan
            .app_args
            .contains(&"--output_dir=/mnt/output".to_string()));
        assert!(plan
            .app_args
            .contains(&"--max_template_date=2022-01-01".to_string()));
        assert!(plan.app_args.contains(&"--run_relax=true".to_string()));
        assert!(plan.app_args.contains(&"--use_gpu_relax=true".to_string()));
        assert_eq!(plan.app_args.last().unwrap(), "--logtostderr");
        assert!(plan.nv);
    }

    #[test]
    fn multimer_reduced_dbs_plan() {
        let mut params = base_params();
        params.model_preset = ModelPreset::Multimer;
        params.db_preset = DbPreset::ReducedDbs;

        let plan = build(&params).unwrap();
        let joined = plan.app_args.join(" ");

        assert!(joined.contains("--uniprot_database_path=/mnt/uniprot_database_path/uniprot.fasta"));
        assert!(joined
            .contains("--pdb_seqres_database_path=/mnt/pdb_seqres_database_path/pdb_seqres.txt"));
        assert!(joined.contains(
            "--small_bfd_database_path=/mnt/small_bfd_database_path/bfd-first_non_consensus_sequences.fasta"
        ));
        assert!(!joined.contains("pdb70_database_path"));
        assert!(!joined.contains("bfd_database_path=/mnt/bfd_database_path"));
        assert!(joined.contains("--model_preset=multimer"));
        assert!(joined.contains("--db_preset=reduced_dbs"));
    }

    #[test]
    fn output_dir_is_bound_to_output_and_tmp() {
        let plan = build(&base_params()).unwrap();
        let spec = plan.binds.render();

        assert!(spec.contains("/scratch/out:/mnt/output"));
        assert!(spec.contains("/scratch/out:/tmp"));
    }

    #[test]
    fn gpu_relax_requires_gpu() {
        let mut params = base_params();
        params.use_gpu = false;

        let plan = build(&params).unwrap();

        assert!(plan.app_args.contains(&"--use_gpu_relax=false".to_string()));
        assert!(!plan.nv);
        assert!(!plan.env.iter().any(|v| v.name == "NVIDIA_VISIBLE_DEVICES"));
    }

    #[test]
    fn gpu_env_is_exported_when_enabled() {
        let mut params = base_params();
        params.gpu_devices = "0".to_string();

        let plan = build(&params).unwrap();
        let devices = plan
            .env
            .iter()
            .find(|v| v.name == "NVIDIA_VISIBLE_DEVICES")
            .unwrap();

        assert_eq!(devices.value, "0");
        assert!(plan
            .env
            .iter()
            .any(|v| v.name == "TF_FORCE_UNIFIED_MEMORY" && v.value == "1"));
        assert!(plan
            .env
            .iter()
            .any(|v| v.name == "OPENMM_CPU_THREADS" && v.value == "12"));
    }

    #[test]
    fn every_fasta_gets_its_own_mount() {
        let mut params = base_params();
        params.fasta_paths = vec![
            PathBuf::from("/a/t1.fasta"),
            PathBuf::from("/b/t2.fasta"),
        ];

        let plan = build(&params).unwrap();

        assert_eq!(
            plan.app_args[0],
            "--fasta_paths=/mnt/fasta_path_0/t1.fasta,/mnt/fasta_path_1/t2.fasta"
        );
    }

    #[test]
    fn duplicate_fasta_basenames_are_rejected() {
        let mut params = base_params();
        params.fasta_paths = vec![
            PathBuf::from("/a/target.fasta"),
            PathBuf::from("/b/target.fasta"),
        ];

        let err = build(&params).unwrap_err();
        assert!(err.to_string().contains("unique basename"));
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::utils::paths;

/// Persistent launcher defaults stored in ~/.foldrun/settings.yaml.
/// Every field is optional; explicit flags and environment variables
/// always win over settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// AlphaFold installation directory (holds alphafold.sif)
    pub alphafold_dir: Option<PathBuf>,

    /// Directory of model parameters and genetic/template databases
    pub data_dir: Option<PathBuf>,

    /// Singularity image, when not <alphafold_dir>/alphafold.sif
    pub image: Option<PathBuf>,

    /// CPU threads for the OpenMM relaxation stage
    pub openmm_cpu_threads: Option<u32>,
}

impl Settings {
    /// Load settings from disk; a missing file means defaults.
    pub fn load() -> Result<Self> {
        let settings_path = paths::get_settings_file()?;

        if !settings_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&settings_path)
            .with_context(|| format!("Failed to read settings: {}", settings_path.display()))?;

        let settings: Settings =
            serde_yaml::from_str(&content).context("Failed to parse settings file")?;

        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        let settings_path = paths::get_settings_file()?;

        if let Some(parent) = settings_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        std::fs::write(&settings_path, content)
            .with_context(|| format!("Failed to write settings: {}", settings_path.display()))?;

        Ok(())
    }

    /// Template written by `foldrun init`
    pub fn template() -> Self {
        Settings {
            alphafold_dir: std::env::var_os("ALPHAFOLD_DIR").map(PathBuf::from),
            data_dir: None,
            image: None,
            openmm_cpu_threads: Some(12),
        }
    }
}

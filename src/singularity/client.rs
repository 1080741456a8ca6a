use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use super::config::RunConfig;

/// Thin wrapper over the Singularity CLI.
pub struct SingularityClient {
    binary: PathBuf,
}

impl SingularityClient {
    /// Locate the container runtime. Apptainer installs ship the same
    /// CLI under their own name.
    pub fn new() -> Result<Self> {
        let binary = which::which("singularity")
            .or_else(|_| which::which("apptainer"))
            .context("Could not find singularity or apptainer on PATH")?;

        Ok(Self { binary })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Query the runtime's version string.
    pub async fn version(&self) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .with_context(|| format!("Failed to execute {}", self.binary.display()))?;

        if !output.status.success() {
            anyhow::bail!(
                "{} --version exited with {}",
                self.binary.display(),
                output.status
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run the image attached, streaming container output to the host's
    /// stdio, and return the container's exit code.
    pub async fn run(&self, config: &RunConfig) -> Result<i32> {
        let args = run_args(config);
        tracing::debug!(
            "Invoking {} {}",
            self.binary.display(),
            args.iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let status = Command::new(&self.binary)
            .args(&args)
            .status()
            .await
            .with_context(|| format!("Failed to execute {}", self.binary.display()))?;

        Ok(status.code().unwrap_or(-1))
    }
}

/// Assemble the argument list for `singularity run`.
fn run_args(config: &RunConfig) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["run".into()];

    if config.nv {
        args.push("--nv".into());
    }

    if !config.bind_spec.is_empty() {
        args.push("--bind".into());
        args.push(config.bind_spec.clone().into());
    }

    for (name, value) in &config.env_vars {
        args.push("--env".into());
        args.push(format!("{name}={value}").into());
    }

    args.push(config.image.clone().into_os_string());
    args.extend(config.app_args.iter().map(OsString::from));

    args
}

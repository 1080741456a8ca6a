use anyhow::{Context, Result};
use tokio::process::Command;

/// Number of GPUs the job will see. A Slurm allocation takes
/// precedence; outside Slurm, count the devices `nvidia-smi -L`
/// reports, which stays accurate under cgroup confinement.
pub async fn requested_gpus() -> Result<usize> {
    if let Ok(value) = std::env::var("SLURM_GPUS_ON_NODE") {
        let value = value.trim();
        if !value.is_empty() {
            return value
                .parse()
                .with_context(|| format!("Unparseable SLURM_GPUS_ON_NODE value: {value}"));
        }
    }

    let output = Command::new("nvidia-smi")
        .arg("-L")
        .output()
        .await
        .context("Failed to run nvidia-smi; is an NVIDIA driver available?")?;

    if !output.status.success() {
        anyhow::bail!("nvidia-smi -L exited with {}", output.status);
    }

    Ok(count_devices(&String::from_utf8_lossy(&output.stdout)))
}

/// Count device lines in `nvidia-smi -L` output.
fn count_devices(listing: &str) -> usize {
    listing.lines().filter(|line| !line.trim().is_empty()).count()
}

use std::path::PathBuf;

/// One invocation of `singularity run`.
pub struct RunConfig {
    pub image: PathBuf,
    pub app_args: Vec<String>,
    /// Comma-joined host:container bind spec
    pub bind_spec: String,
    pub env_vars: Vec<(String, String)>,
    /// Enable the NVIDIA runtime (--nv)
    pub nv: bool,
}

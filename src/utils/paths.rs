use anyhow::{Context, Result};
use std::env;
use std::path::{Component, Path, PathBuf};

/// Get the foldrun configuration directory (~/.foldrun)
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".foldrun"))
}

/// Get the settings file path
pub fn get_settings_file() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("settings.yaml"))
}

/// Host directory that receives the results. $TMP wins, then $TMPDIR,
/// then a fresh alphafold-* directory under /tmp.
pub fn default_output_dir() -> Result<PathBuf> {
    for var in ["TMP", "TMPDIR"] {
        if let Some(dir) = env::var_os(var) {
            if !dir.is_empty() {
                return absolute(Path::new(&dir));
            }
        }
    }

    let dir = tempfile::Builder::new()
        .prefix("alphafold-")
        .tempdir_in("/tmp")
        .context("Failed to create an output directory under /tmp")?;

    Ok(dir.keep())
}

/// Make a path absolute without touching the filesystem: relative paths
/// are joined to the current directory, `.` and `..` are collapsed
/// lexically. The path does not have to exist.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .context("Failed to get current directory")?
            .join(path)
    };

    Ok(normalize(&joined))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_keeps_absolute_paths() {
        let path = absolute(Path::new("/data/alphafold")).unwrap();
        assert_eq!(path, Path::new("/data/alphafold"));
    }

    #[test]
    fn absolute_joins_relative_paths_to_cwd() {
        let cwd = env::current_dir().unwrap();
        let path = absolute(Path::new("targets/t1.fasta")).unwrap();
        assert_eq!(path, cwd.join("targets/t1.fasta"));
    }

    #[test]
    fn normalize_collapses_dot_and_dotdot() {
        assert_eq!(
            normalize(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
        assert_eq!(normalize(Path::new("/a/./b")), PathBuf::from("/a/b"));
    }

    #[test]
    fn normalize_stops_at_root() {
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
    }
}

//! Bind-mount bookkeeping for the container invocation.

use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Root of all named mount points inside the container.
pub const MOUNT_ROOT: &str = "/mnt";

#[derive(Debug, Error)]
pub enum BindError {
    #[error("duplicate bind target: {0}")]
    DuplicateTarget(PathBuf),

    #[error("bind source has no file name: {0}")]
    NoFileName(PathBuf),
}

/// A host -> container bind mount.
///
/// Singularity binds are read-only by default, so no mode suffix is
/// rendered.
#[derive(Debug, Clone, Serialize)]
pub struct Bind {
    pub source: PathBuf,
    pub target: PathBuf,
}

impl Bind {
    pub fn render(&self) -> String {
        format!("{}:{}", self.source.display(), self.target.display())
    }
}

/// The accumulated bind mounts of one launch. Container targets must be
/// unique across the set.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct BindSet {
    binds: Vec<Bind>,
    #[serde(skip)]
    targets: HashSet<PathBuf>,
}

impl BindSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the parent directory of `path` at `/mnt/<name>` and return
    /// the in-container path of the file itself.
    pub fn add_file(&mut self, name: &str, path: &Path) -> Result<PathBuf, BindError> {
        let file_name = path
            .file_name()
            .ok_or_else(|| BindError::NoFileName(path.to_path_buf()))?
            .to_os_string();
        let source = path
            .parent()
            .ok_or_else(|| BindError::NoFileName(path.to_path_buf()))?
            .to_path_buf();
        let target = Path::new(MOUNT_ROOT).join(name);
        self.push(source, target.clone())?;
        Ok(target.join(file_name))
    }

    /// Bind the directory `path` itself at `/mnt/<name>` and return the
    /// target.
    pub fn add_dir(&mut self, name: &str, path: &Path) -> Result<PathBuf, BindError> {
        let target = Path::new(MOUNT_ROOT).join(name);
        self.push(path.to_path_buf(), target.clone())?;
        Ok(target)
    }

    /// Bind `source` at an explicit container target.
    pub fn add_at(&mut self, source: &Path, target: &Path) -> Result<(), BindError> {
        self.push(source.to_path_buf(), target.to_path_buf())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bind> {
        self.binds.iter()
    }

    /// The comma-joined bind spec passed to `singularity run --bind`.
    pub fn render(&self) -> String {
        self.binds
            .iter()
            .map(Bind::render)
            .collect::<Vec<_>>()
            .join(",")
    }

    fn push(&mut self, source: PathBuf, target: PathBuf) -> Result<(), BindError> {
        if !self.targets.insert(target.clone()) {
            return Err(BindError::DuplicateTarget(target));
        }
        tracing::info!("Binding {} -> {}", source.display(), target.display());
        self.binds.push(Bind { source, target });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_bind_mounts_parent_directory() {
        let mut binds = BindSet::new();
        let data_path = binds
            .add_file("fasta_path_0", Path::new("/home/user/targets/t1.fasta"))
            .unwrap();

        assert_eq!(data_path, Path::new("/mnt/fasta_path_0/t1.fasta"));
        let bind = binds.iter().next().unwrap();
        assert_eq!(bind.source, Path::new("/home/user/targets"));
        assert_eq!(bind.target, Path::new("/mnt/fasta_path_0"));
    }

    #[test]
    fn dir_bind_mounts_the_directory_itself() {
        let mut binds = BindSet::new();
        let target = binds.add_dir("data_dir", Path::new("/db")).unwrap();

        assert_eq!(target, Path::new("/mnt/data_dir"));
        let bind = binds.iter().next().unwrap();
        assert_eq!(bind.source, Path::new("/db"));
    }

    #[test]
    fn duplicate_target_is_rejected() {
        let mut binds = BindSet::new();
        binds.add_dir("data_dir", Path::new("/a")).unwrap();
        let err = binds.add_dir("data_dir", Path::new("/b")).unwrap_err();
        assert!(matches!(err, BindError::DuplicateTarget(_)));
    }

    #[test]
    fn same_source_different_targets_is_allowed() {
        // obsolete.dat and the mmCIF dir both live under pdb_mmcif
        let mut binds = BindSet::new();
        binds
            .add_file("template_mmcif_dir", Path::new("/db/pdb_mmcif/mmcif_files"))
            .unwrap();
        binds
            .add_file("obsolete_pdbs_path", Path::new("/db/pdb_mmcif/obsolete.dat"))
            .unwrap();
        assert_eq!(binds.iter().count(), 2);
    }

    #[test]
    fn render_joins_with_commas() {
        let mut binds = BindSet::new();
        binds.add_dir("data_dir", Path::new("/db")).unwrap();
        binds.add_at(Path::new("/out"), Path::new("/mnt/output")).unwrap();
        assert_eq!(binds.render(), "/db:/mnt/data_dir,/out:/mnt/output");
    }

    #[test]
    fn root_path_has_no_file_name() {
        let mut binds = BindSet::new();
        let err = binds.add_file("x", Path::new("/")).unwrap_err();
        assert!(matches!(err, BindError::NoFileName(_)));
    }
}

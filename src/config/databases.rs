use std::path::{Path, PathBuf};

use crate::config::presets::{DbPreset, ModelPreset};

/// One supporting database under `data_dir`, addressed by the flag name
/// the wrapped pipeline expects for it.
#[derive(Debug, Clone)]
pub struct DatabaseEntry {
    pub name: &'static str,
    pub path: PathBuf,
}

impl DatabaseEntry {
    fn new(name: &'static str, path: PathBuf) -> Self {
        Self { name, path }
    }
}

/// The databases a run with the given presets reads, in the order they
/// are passed to the pipeline. The `data_dir` entry is the directory
/// itself; it holds the model parameters.
pub fn database_paths(
    data_dir: &Path,
    model_preset: ModelPreset,
    db_preset: DbPreset,
) -> Vec<DatabaseEntry> {
    let mut entries = vec![
        // Uniref90, for use by JackHMMER
        DatabaseEntry::new(
            "uniref90_database_path",
            data_dir.join("uniref90").join("uniref90.fasta"),
        ),
        // MGnify, for use by JackHMMER
        DatabaseEntry::new(
            "mgnify_database_path",
            data_dir.join("mgnify").join("mgy_clusters_2022_05.fa"),
        ),
        DatabaseEntry::new("data_dir", data_dir.to_path_buf()),
        // Template mmCIF structures, each named <pdb_id>.cif
        DatabaseEntry::new(
            "template_mmcif_dir",
            data_dir.join("pdb_mmcif").join("mmcif_files"),
        ),
        // Mapping of obsolete PDB IDs to their replacements
        DatabaseEntry::new(
            "obsolete_pdbs_path",
            data_dir.join("pdb_mmcif").join("obsolete.dat"),
        ),
    ];

    if model_preset.is_multimer() {
        // Uniprot, for use by JackHMMER
        entries.push(DatabaseEntry::new(
            "uniprot_database_path",
            data_dir.join("uniprot").join("uniprot.fasta"),
        ));
        // PDB seqres, for use by hmmsearch
        entries.push(DatabaseEntry::new(
            "pdb_seqres_database_path",
            data_dir.join("pdb_seqres").join("pdb_seqres.txt"),
        ));
    } else {
        // PDB70, for use by HHsearch
        entries.push(DatabaseEntry::new(
            "pdb70_database_path",
            data_dir.join("pdb70").join("pdb70"),
        ));
    }

    match db_preset {
        DbPreset::ReducedDbs => {
            // Small BFD, for use by JackHMMER
            entries.push(DatabaseEntry::new(
                "small_bfd_database_path",
                data_dir
                    .join("small_bfd")
                    .join("bfd-first_non_consensus_sequences.fasta"),
            ));
        }
        DbPreset::FullDbs => {
            // Uniref30 and BFD, for use by HHblits
            entries.push(DatabaseEntry::new(
                "uniref30_database_path",
                data_dir.join("uniref30").join("UniRef30_2021_03"),
            ));
            entries.push(DatabaseEntry::new(
                "bfd_database_path",
                data_dir
                    .join("bfd")
                    .join("bfd_metaclust_clu_complete_id30_c90_final_seq.sorted_opt"),
            ));
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn names(entries: &[DatabaseEntry]) -> Vec<&'static str> {
        entries.iter().map(|e| e.name).collect()
    }

    #[test]
    fn monomer_full_dbs_selection() {
        let entries = database_paths(
            Path::new("/db"),
            ModelPreset::Monomer,
            DbPreset::FullDbs,
        );
        let names = names(&entries);

        assert!(names.contains(&"pdb70_database_path"));
        assert!(names.contains(&"uniref30_database_path"));
        assert!(names.contains(&"bfd_database_path"));
        assert!(!names.contains(&"uniprot_database_path"));
        assert!(!names.contains(&"pdb_seqres_database_path"));
        assert!(!names.contains(&"small_bfd_database_path"));
        assert_eq!(entries.len(), 8);
    }

    #[test]
    fn multimer_reduced_dbs_selection() {
        let entries = database_paths(
            Path::new("/db"),
            ModelPreset::Multimer,
            DbPreset::ReducedDbs,
        );
        let names = names(&entries);

        assert!(names.contains(&"uniprot_database_path"));
        assert!(names.contains(&"pdb_seqres_database_path"));
        assert!(names.contains(&"small_bfd_database_path"));
        assert!(!names.contains(&"pdb70_database_path"));
        assert!(!names.contains(&"uniref30_database_path"));
        assert!(!names.contains(&"bfd_database_path"));
        assert_eq!(entries.len(), 8);
    }

    #[test]
    fn all_paths_live_under_data_dir() {
        let data_dir = Path::new("/data/alphafold_databases");
        let entries = database_paths(data_dir, ModelPreset::Multimer, DbPreset::FullDbs);
        for entry in &entries {
            assert!(
                entry.path.starts_with(data_dir),
                "{} escapes data_dir",
                entry.path.display()
            );
        }
    }

    #[test]
    fn data_dir_entry_is_the_directory_itself() {
        let entries = database_paths(Path::new("/db"), ModelPreset::Monomer, DbPreset::FullDbs);
        let entry = entries.iter().find(|e| e.name == "data_dir").unwrap();
        assert_eq!(entry.path, Path::new("/db"));
    }
}

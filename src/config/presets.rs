use clap::ValueEnum;
use std::fmt;

/// Model configuration preset. Flag values are spelled exactly as the
/// wrapped pipeline expects them, so they pass through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelPreset {
    /// The standard monomer model
    #[value(name = "monomer")]
    Monomer,

    /// Monomer model with extra ensembling
    #[value(name = "monomer_casp14")]
    MonomerCasp14,

    /// Monomer model with a pTM head
    #[value(name = "monomer_ptm")]
    MonomerPtm,

    /// The multimer model
    #[value(name = "multimer")]
    Multimer,
}

impl ModelPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelPreset::Monomer => "monomer",
            ModelPreset::MonomerCasp14 => "monomer_casp14",
            ModelPreset::MonomerPtm => "monomer_ptm",
            ModelPreset::Multimer => "multimer",
        }
    }

    pub fn is_multimer(&self) -> bool {
        matches!(self, ModelPreset::Multimer)
    }
}

impl fmt::Display for ModelPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// MSA database configuration preset: the full genetic databases, or the
/// smaller reduced set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DbPreset {
    #[value(name = "full_dbs")]
    FullDbs,

    #[value(name = "reduced_dbs")]
    ReducedDbs,
}

impl DbPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            DbPreset::FullDbs => "full_dbs",
            DbPreset::ReducedDbs => "reduced_dbs",
        }
    }
}

impl fmt::Display for DbPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

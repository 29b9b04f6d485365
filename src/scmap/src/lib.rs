//! Survival Chaos map data extraction
//!
//! Turns a map's decoded object tables and its `war3map.j` script into the
//! documents the race browser reads.
//!
//! # Pipeline
//!
//! 1. [`Catalog`] loads the four object tables (units, items, abilities,
//!    upgrades) plus the game's baseline tables used for fallbacks.
//! 2. A [`ScriptMiner`] for the map's [`MapVariant`] pulls race layouts,
//!    ultimates, artifacts and neutrals out of the script as entity ids.
//! 3. [`Assembler`] resolves those ids through the category extractors into
//!    typed objects and collects every icon it touches.
//!
//! # Map variants
//!
//! - `og`: the classic map. Ids appear in the script as quoted literals
//!   (`'h001'`), race pickers are units.
//! - `oz`: the OZ fork. Ids appear as packed integers (`1211117617`), race
//!   pickers are abilities.

pub mod assemble;
pub mod catalog;
pub mod categories;
pub mod misc;
pub mod objects;
pub mod raw;
pub mod script;
pub mod variant;

// Re-export main types
pub use assemble::{Assembler, DataFile, Extraction};
pub use catalog::{Baseline, Catalog, IconMap};
pub use categories::{Abilities, CategoryRules, Items, Units, Upgrades};
pub use misc::{parse_damage_table, DamageTable};
pub use raw::{RawPatchData, RawRace};
pub use script::{miner_for, OgMiner, OzMiner, ScriptMiner};
pub use variant::{ExtractOptions, MapVariant};

/// Errors from extraction
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Missing {field} for {category} {id}")]
    MissingLinkage {
        category: String,
        id: String,
        field: String,
    },

    #[error("Unknown map variant: {0}")]
    UnknownVariant(String),

    #[error(transparent)]
    Data(#[from] w3data::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn missing(
        category: impl ToString,
        id: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Error::MissingLinkage {
            category: category.to_string(),
            id: id.into(),
            field: field.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

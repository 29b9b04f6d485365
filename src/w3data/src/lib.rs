//! Object table and script mining substrate for Warcraft III map data
//!
//! Maps store their balance data in two very different shapes:
//!
//! ## Object tables (`war3map.w3u` / `.w3t` / `.w3a` / `.w3q`)
//!
//! Decoded elsewhere into leveled key/value records per entity:
//! - Entity id: 4 characters (`hfoo`, `A0C5`, `R09Q`)
//! - Field key: 3 characters once the category prefix is stripped (`nam`, `hpm`)
//! - Level: progression tier, `0` for unleveled fields
//! - Value: string or number
//!
//! An optional skin table (`war3mapSkin.*`) overlays the base table. Custom
//! entities are keyed `newId:baseId`, which becomes a backlink record.
//!
//! ## Script (`war3map.j`)
//!
//! Flat JASS text. Ids appear either as quoted literals (`'hfoo'`) or as packed
//! 32-bit integers (`1751543663`), see [`fourcc`]. Relevant fragments are carved
//! out with [`block::extract_conditional_block`].

pub mod block;
pub mod entity;
pub mod format;
pub mod fourcc;
mod hash;
pub mod patch;
pub mod profile;
mod record;
pub mod resolve;
pub mod script;
pub mod slk;
pub mod strings;
pub mod table;

// Re-export main types
pub use block::extract_conditional_block;
pub use entity::EntityView;
pub use format::{TextFormatter, PLACEHOLDER_TEXT};
pub use fourcc::{decode as decode_fourcc, decode_literal, encode as encode_fourcc, DECODE_THRESHOLD};
pub use hash::{fnv1a_hash, model_hash};
pub use patch::PatchTable;
pub use profile::ProfileTable;
pub use record::{Category, RawRecord, Value, BACKLINK_KEY, LEVEL_COUNT_KEY};
pub use resolve::with_fallback;
pub use script::{parse_jass_int, FunctionBody, ScriptText};
pub use slk::SideTable;
pub use strings::StringTable;
pub use table::{
    DecodedField, DirectorySource, EntityRawTable, Layer, MemorySource, ObjectTable,
    RawTableStore, TableSource,
};

/// Errors from table loading and script mining
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Missing base table for {category}: {path}")]
    MissingBaseTable { category: Category, path: String },

    #[error("Start position {position} is not at an if/elseif block")]
    NotAtConditional { position: usize },

    #[error("Invalid FourCC identifier: {0:?}")]
    InvalidFourCc(String),

    #[error("Malformed SYLK record at line {line}: {reason}")]
    Sylk { line: usize, reason: String },

    #[error("Failed to apply patch for {id}: {source}")]
    Patch {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

//! Locations of the decoded map files inside a data directory

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use w3data::{DirectorySource, RawTableStore, StringTable, TextFormatter};

pub const SCRIPT_FILE: &str = "war3map.j";
pub const STRINGS_FILE: &str = "war3map.wts";
pub const MISC_FILE: &str = "war3mapMisc.txt";

/// Table store over `data_dir`, resolving `TRIGSTR_` references through the
/// map's string table when there is one
pub fn open_store(data_dir: &Path) -> Result<RawTableStore<DirectorySource>> {
    let strings_path = data_dir.join(STRINGS_FILE);
    let strings = StringTable::load(&strings_path)
        .with_context(|| format!("Failed to read strings from {}", strings_path.display()))?;
    tracing::debug!("Loaded {} map strings", strings.len());

    Ok(RawTableStore::new(
        DirectorySource::new(data_dir),
        Arc::new(TextFormatter::new(strings)),
    ))
}

//! Entity inspection command handler

use crate::map_files::open_store;
use anyhow::{bail, Context, Result};
use std::path::Path;
use w3data::{Category, EntityView};

/// Handle the entity command
pub fn handle(category: Category, id: &str, level: Option<u32>, data_dir: &Path) -> Result<()> {
    let table = open_store(data_dir)?
        .load(category)
        .with_context(|| format!("Failed to load {} table", category))?;

    let Some(view) = table.get(id) else {
        bail!("No {} entity with id {}", category, id);
    };

    println!("{} {} (max level {})", category, view.id(), view.max_level());
    for line in describe(&view, level) {
        println!("  {}", line);
    }
    Ok(())
}

/// One `field[level] = value` line per record, values formatted
fn describe(view: &EntityView<'_>, level: Option<u32>) -> Vec<String> {
    view.records()
        .iter()
        .filter(|record| level.map_or(true, |l| record.level == l))
        .map(|record| {
            let value = view
                .value(&record.key, Some(record.level))
                .map(|v| v.to_string())
                .unwrap_or_default();
            if record.level == 0 {
                format!("{} = {}", record.key, value)
            } else {
                format!("{}[{}] = {}", record.key, record.level, value)
            }
        })
        .collect()
}

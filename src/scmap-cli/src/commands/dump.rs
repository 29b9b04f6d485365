//! Object table dump command handlers

use crate::map_files::open_store;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::fs;
use std::path::Path;
use w3data::{Category, EntityRawTable, EntityView, RawRecord};

/// Entity id to its records, skin records first
pub type RawDump = IndexMap<String, Vec<RawRecord>>;

/// Entity id to `field -> value`, or `field -> [values]` for leveled fields
pub type CompactDump = IndexMap<String, IndexMap<String, JsonValue>>;

/// Handle the dump command
pub fn handle(category: Category, data_dir: &Path, output: Option<&Path>) -> Result<()> {
    let table = open_store(data_dir)?
        .load(category)
        .with_context(|| format!("Failed to load {} table", category))?;

    let compact = compact_table(&table);
    match output {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let raw_path = dir.join(format!("{category}.raw.json"));
            let compact_path = dir.join(format!("{category}.json"));
            fs::write(&raw_path, serde_json::to_string_pretty(&raw_table(&table))?)
                .with_context(|| format!("Failed to write {}", raw_path.display()))?;
            fs::write(&compact_path, serde_json::to_string_pretty(&compact)?)
                .with_context(|| format!("Failed to write {}", compact_path.display()))?;
            println!(
                "Dumped {} {} entities to {}",
                table.len(),
                category,
                dir.display()
            );
        }
        None => println!("{}", serde_json::to_string_pretty(&compact)?),
    }
    Ok(())
}

pub fn raw_table(table: &EntityRawTable) -> RawDump {
    table
        .iter()
        .map(|view| (view.id().to_string(), view.records().to_vec()))
        .collect()
}

pub fn compact_table(table: &EntityRawTable) -> CompactDump {
    table
        .iter()
        .map(|view| (view.id().to_string(), compact_entity(&view)))
        .collect()
}

/// Formatted values per field, first-seen field order
fn compact_entity(view: &EntityView<'_>) -> IndexMap<String, JsonValue> {
    let mut fields = IndexMap::new();
    for record in view.records() {
        if fields.contains_key(&record.key) {
            continue;
        }
        let mut values: Vec<JsonValue> = view
            .all_values(&record.key)
            .into_iter()
            .map(|value| serde_json::to_value(value).unwrap_or(JsonValue::Null))
            .collect();
        let value = if values.len() == 1 {
            values.remove(0)
        } else {
            JsonValue::Array(values)
        };
        fields.insert(record.key.clone(), value);
    }
    fields
}

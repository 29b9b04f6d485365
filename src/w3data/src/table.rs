//! Raw object tables
//!
//! The object-table decoder emits one JSON document per table:
//!
//! ```json
//! {
//!   "original": { "hfoo": [{ "id": "unam", "type": "string", "level": 0, "column": 0, "value": "Footman" }] },
//!   "custom":   { "h000:hfoo": [{ "id": "uhpm", "type": "int", "level": 0, "column": 0, "value": 500 }] }
//! }
//! ```
//!
//! Field ids carry a one-character category prefix that is stripped on load.
//! Custom keys `newId:baseId` gain a trailing backlink record. When a skin
//! table exists its records are placed ahead of the base records, so a linear
//! first-match lookup prefers the skin.

use crate::entity::EntityView;
use crate::format::TextFormatter;
use crate::record::{Category, RawRecord, Value};
use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

// ============================================================================
// Decoder output
// ============================================================================

/// One field as emitted by the object-table decoder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedField {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub column: u32,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl DecodedField {
    /// Convert into a record, dropping the category prefix of the field id
    fn into_record(self) -> RawRecord {
        let key = self.id.chars().skip(1).collect::<String>();
        let value = match self.value {
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Real(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::Bool(b) => Value::Int(i64::from(b)),
            serde_json::Value::Null => Value::Text(String::new()),
            other => Value::Text(other.to_string()),
        };
        RawRecord {
            key,
            level: self.level,
            column: self.column,
            value,
        }
    }
}

/// A decoded table: stock entities and map-defined ones
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectTable {
    #[serde(default)]
    pub original: IndexMap<String, Vec<DecodedField>>,
    #[serde(default)]
    pub custom: IndexMap<String, Vec<DecodedField>>,
}

impl ObjectTable {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Flatten into id -> records, splitting `newId:baseId` keys
    pub fn into_entities(self) -> IndexMap<String, Vec<RawRecord>> {
        let mut entities = IndexMap::new();

        for (key, fields) in self.original.into_iter().chain(self.custom) {
            let (id, base_id) = match key.split_once(':') {
                Some((id, base)) => (id.to_string(), Some(base.to_string())),
                None => (key, None),
            };

            let mut records: Vec<RawRecord> =
                fields.into_iter().map(DecodedField::into_record).collect();
            if let Some(base_id) = base_id.filter(|b| !b.is_empty()) {
                records.push(RawRecord::backlink(&base_id));
            }
            entities.insert(id, records);
        }

        entities
    }
}

// ============================================================================
// Sources
// ============================================================================

/// Which of the two tables of a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Base,
    Variant,
}

/// Where decoded tables come from
pub trait TableSource {
    /// Read one table; `Ok(None)` when it does not exist
    fn read(&self, category: Category, layer: Layer) -> Result<Option<ObjectTable>>;

    /// Human readable location, used in errors
    fn describe(&self, category: Category, layer: Layer) -> String;
}

/// Tables stored as `war3map.<ext>.json` / `war3mapSkin.<ext>.json`
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn table_path(&self, category: Category, layer: Layer) -> PathBuf {
        let stem = match layer {
            Layer::Base => "war3map",
            Layer::Variant => "war3mapSkin",
        };
        self.root
            .join(format!("{}.{}.json", stem, category.extension()))
    }
}

impl TableSource for DirectorySource {
    fn read(&self, category: Category, layer: Layer) -> Result<Option<ObjectTable>> {
        let path = self.table_path(category, layer);
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)?;
        ObjectTable::from_json_str(&json).map(Some)
    }

    fn describe(&self, category: Category, layer: Layer) -> String {
        self.table_path(category, layer).display().to_string()
    }
}

/// In-memory tables, for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<(Category, Layer), ObjectTable>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: Category, layer: Layer, table: ObjectTable) {
        self.tables.insert((category, layer), table);
    }

    pub fn with(mut self, category: Category, layer: Layer, table: ObjectTable) -> Self {
        self.insert(category, layer, table);
        self
    }
}

impl TableSource for MemorySource {
    fn read(&self, category: Category, layer: Layer) -> Result<Option<ObjectTable>> {
        Ok(self.tables.get(&(category, layer)).cloned())
    }

    fn describe(&self, category: Category, layer: Layer) -> String {
        format!("<memory {} {:?}>", category, layer)
    }
}

// ============================================================================
// Merged table
// ============================================================================

/// All entities of one category, skin records first
#[derive(Debug, Clone)]
pub struct EntityRawTable {
    category: Category,
    entities: IndexMap<String, Vec<RawRecord>>,
    formatter: Arc<TextFormatter>,
}

impl EntityRawTable {
    pub fn new(
        category: Category,
        entities: IndexMap<String, Vec<RawRecord>>,
        formatter: Arc<TextFormatter>,
    ) -> Self {
        Self {
            category,
            entities,
            formatter,
        }
    }

    /// Merge a base table with an optional variant table
    pub fn merge(
        category: Category,
        base: ObjectTable,
        variant: Option<ObjectTable>,
        formatter: Arc<TextFormatter>,
    ) -> Self {
        let mut entities = base.into_entities();

        if let Some(variant) = variant {
            for (id, mut records) in variant.into_entities() {
                match entities.get_mut(&id) {
                    Some(existing) => {
                        records.append(existing);
                        *existing = records;
                    }
                    None => {
                        entities.insert(id, records);
                    }
                }
            }
        }

        Self::new(category, entities, formatter)
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn formatter(&self) -> &TextFormatter {
        &self.formatter
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    /// Entity ids in table order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    pub fn get(&self, id: &str) -> Option<EntityView<'_>> {
        self.entities
            .get_key_value(id)
            .map(|(id, records)| EntityView::new(id, records, self))
    }

    /// Iterate over every entity
    pub fn iter(&self) -> impl Iterator<Item = EntityView<'_>> {
        self.entities
            .iter()
            .map(|(id, records)| EntityView::new(id, records, self))
    }

    /// Ids having a `key` record matching `predicate`
    pub fn find_ids<F>(&self, key: &str, predicate: F) -> Vec<String>
    where
        F: Fn(&Value) -> bool,
    {
        self.entities
            .iter()
            .filter(|(_, records)| {
                records
                    .iter()
                    .any(|r| r.key == key && predicate(&r.value))
            })
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Ids having a `key` record equal to `value`
    pub fn ids_by_value(&self, key: &str, value: impl Into<Value>) -> Vec<String> {
        let value = value.into();
        self.find_ids(key, |v| *v == value)
    }
}

/// Loads merged tables from a [`TableSource`]
pub struct RawTableStore<S> {
    source: S,
    formatter: Arc<TextFormatter>,
}

impl<S: TableSource> RawTableStore<S> {
    pub fn new(source: S, formatter: Arc<TextFormatter>) -> Self {
        Self { source, formatter }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Load one category; the base table must exist, the variant is optional
    pub fn load(&self, category: Category) -> Result<EntityRawTable> {
        let base = self
            .source
            .read(category, Layer::Base)?
            .ok_or_else(|| Error::MissingBaseTable {
                category,
                path: self.source.describe(category, Layer::Base),
            })?;

        let variant = self.source.read(category, Layer::Variant)?;
        if variant.is_some() {
            debug!(
                "Merging variant table {}",
                self.source.describe(category, Layer::Variant)
            );
        }

        let table = EntityRawTable::merge(category, base, variant, Arc::clone(&self.formatter));
        debug!("Loaded {} {} entities", table.len(), category);
        Ok(table)
    }
}

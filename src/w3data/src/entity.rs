//! Per-entity query surface over a merged table

use crate::record::{Category, RawRecord, Value, BACKLINK_KEY, LEVEL_COUNT_KEY};
use crate::table::EntityRawTable;

/// Read-only view of one entity's records
///
/// Lookups scan the records in order and the first match wins, so skin
/// records shadow base records.
#[derive(Debug, Clone, Copy)]
pub struct EntityView<'a> {
    id: &'a str,
    records: &'a [RawRecord],
    table: &'a EntityRawTable,
}

impl<'a> EntityView<'a> {
    pub(crate) fn new(id: &'a str, records: &'a [RawRecord], table: &'a EntityRawTable) -> Self {
        Self { id, records, table }
    }

    pub fn id(&self) -> &'a str {
        self.id
    }

    pub fn category(&self) -> Category {
        self.table.category()
    }

    pub fn table(&self) -> &'a EntityRawTable {
        self.table
    }

    pub fn records(&self) -> &'a [RawRecord] {
        self.records
    }

    /// First record for `key`, at `level` when given
    pub fn find(&self, key: &str, level: Option<u32>) -> Option<&'a RawRecord> {
        self.records
            .iter()
            .find(|r| r.key == key && level.map_or(true, |l| r.level == l))
    }

    /// Id of the entity this one was derived from
    pub fn backlink_id(&self) -> Option<&'a str> {
        self.find(BACKLINK_KEY, None)?.value.as_str()
    }

    /// Formatted value
    pub fn value(&self, key: &str, level: Option<u32>) -> Option<Value> {
        self.find(key, level)
            .map(|r| self.table.formatter().format(&r.value))
    }

    /// Formatted value as text
    pub fn text(&self, key: &str, level: Option<u32>) -> Option<String> {
        self.value(key, level).map(|v| v.to_string())
    }

    /// Value with references resolved and control sequences removed
    pub fn raw(&self, key: &str, level: Option<u32>) -> Option<Value> {
        self.find(key, level)
            .map(|r| self.table.formatter().strip(&r.value))
    }

    pub fn raw_text(&self, key: &str, level: Option<u32>) -> Option<String> {
        self.raw(key, level).map(|v| v.to_string())
    }

    /// Comma separated raw value, trimmed, without empty items
    ///
    /// `None` both when the field is absent and when nothing is left.
    pub fn array(&self, key: &str, level: Option<u32>) -> Option<Vec<String>> {
        let raw = self.raw_text(key, level)?;
        let items: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        (!items.is_empty()).then_some(items)
    }

    /// Every formatted value of `key`, by ascending level
    pub fn all_values(&self, key: &str) -> Vec<Value> {
        self.all_values_by(key, |_| true)
    }

    /// Like [`Self::all_values`], keeping only records matching `predicate`
    pub fn all_values_by<F>(&self, key: &str, predicate: F) -> Vec<Value>
    where
        F: Fn(&RawRecord) -> bool,
    {
        let mut matching: Vec<&RawRecord> = self
            .records
            .iter()
            .filter(|r| r.key == key)
            .collect();
        matching.sort_by_key(|r| r.level);

        let formatter = self.table.formatter();
        matching
            .into_iter()
            .filter(|r| predicate(r))
            .map(|r| formatter.format(&r.value))
            .collect()
    }

    /// Highest level of this entity
    ///
    /// An explicit non-zero level count wins; otherwise the largest level seen
    /// on any record. Levels can be sparse, so this is not a record count.
    pub fn max_level(&self) -> u32 {
        if let Some(count) = self.find(LEVEL_COUNT_KEY, None) {
            if count.value.is_number() {
                let n = count.value.to_f64().unwrap_or_default();
                if n > 0.0 {
                    return n as u32;
                }
            }
        }

        self.records.iter().map(|r| r.level).max().unwrap_or(0)
    }
}

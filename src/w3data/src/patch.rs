//! Per-id manual corrections for assembled objects
//!
//! A patch is a JSON object merged into the serialized form of an object:
//! lists are concatenated (patch items after existing ones), nested objects
//! merge key by key, anything else is replaced.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct PatchTable {
    entries: HashMap<String, JsonValue>,
}

impl PatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `{ "<id>": { ...partial object... } }`
    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: HashMap<String, JsonValue> = serde_json::from_str(json)?;
        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn insert(&mut self, id: impl Into<String>, patch: JsonValue) {
        self.entries.insert(id.into(), patch);
    }

    /// Add entries from `other`; an id present in both merges the two patches
    pub fn extend(&mut self, other: PatchTable) {
        for (id, patch) in other.entries {
            match self.entries.get_mut(&id) {
                Some(existing) => merge_patch(existing, patch),
                None => {
                    self.entries.insert(id, patch);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&JsonValue> {
        self.entries.get(id)
    }

    /// Merge the patch for `id` into `object`
    ///
    /// Returns `object` untouched when there is no patch for `id`.
    pub fn apply<T>(&self, id: &str, object: T) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let Some(patch) = self.entries.get(id) else {
            return Ok(object);
        };

        let to_patch_error = |source| Error::Patch {
            id: id.to_string(),
            source,
        };
        let mut value = serde_json::to_value(object).map_err(to_patch_error)?;
        merge_patch(&mut value, patch.clone());
        serde_json::from_value(value).map_err(to_patch_error)
    }
}

/// Deep merge `patch` into `target`
pub fn merge_patch(target: &mut JsonValue, patch: JsonValue) {
    match (target, patch) {
        (JsonValue::Array(items), JsonValue::Array(extra)) => items.extend(extra),
        (JsonValue::Array(items), single) => items.push(single),
        (JsonValue::Object(fields), JsonValue::Object(overrides)) => {
            for (key, value) in overrides {
                match fields.get_mut(&key) {
                    Some(existing) => merge_patch(existing, value),
                    None => {
                        fields.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

//! Map variants and per-variant manual corrections

use crate::Error;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use w3data::{Category, PatchTable};

/// Which map family the inputs come from
///
/// The two families share the object table format but lay out their
/// scripts differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapVariant {
    /// Official Sur5al/W3C releases
    #[default]
    Og,
    /// OZGame edition
    Oz,
}

impl MapVariant {
    pub const ALL: [MapVariant; 2] = [MapVariant::Og, MapVariant::Oz];

    pub fn name(self) -> &'static str {
        match self {
            MapVariant::Og => "og",
            MapVariant::Oz => "oz",
        }
    }

    /// Table holding the race picker entities
    pub fn picker_category(self) -> Category {
        match self {
            MapVariant::Og => Category::Units,
            MapVariant::Oz => Category::Abilities,
        }
    }

    /// Built-in corrections for objects the map data gets wrong
    pub fn patches(self) -> PatchTable {
        let mut table = PatchTable::new();
        if self == MapVariant::Og {
            // 4.25: bonus order on DI
            table.insert("n02H", json!({ "hotkey": "Q" }));
            // 4.25: DI range upgrade icons
            table.insert("R09Q", json!({ "iconsCount": 3 }));
            // 4.25: artifacts bonus spell
            table.insert("A0C5", json!({ "hotkey": "C" }));
        }
        table
    }
}

impl fmt::Display for MapVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MapVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "og" | "sur5al" => Ok(MapVariant::Og),
            "oz" => Ok(MapVariant::Oz),
            _ => Err(Error::UnknownVariant(s.to_string())),
        }
    }
}

/// Settings for one extraction pass
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    pub variant: MapVariant,
    /// Corrections layered over the variant's built-in ones
    pub extra_patches: Option<PatchTable>,
}

impl ExtractOptions {
    pub fn new(variant: MapVariant) -> Self {
        Self {
            variant,
            extra_patches: None,
        }
    }

    pub fn with_patches(mut self, patches: PatchTable) -> Self {
        self.extra_patches = Some(patches);
        self
    }

    /// Built-in patches merged with the extra ones
    pub fn patch_table(&self) -> PatchTable {
        let mut table = self.variant.patches();
        if let Some(extra) = &self.extra_patches {
            table.extend(extra.clone());
        }
        table
    }
}

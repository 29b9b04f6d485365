//! The loaded object tables and the baseline data they fall back to

use crate::categories::{Abilities, Items, Units, Upgrades, ART_KEYS};
use crate::Result;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};
use w3data::{Category, EntityRawTable, PatchTable, ProfileTable, RawTableStore, SideTable, TableSource};

/// Icon key (entity id, or `<id>-<n>` for multi-icon upgrades) to icon path
pub type IconMap = IndexMap<String, String>;

const UNIT_STRING_FILES: [&str; 6] = [
    "neutralunitstrings.txt",
    "humanunitstrings.txt",
    "nightelfunitstrings.txt",
    "orcunitstrings.txt",
    "undeadunitstrings.txt",
    "unitskinstrings.txt",
];

const UPGRADE_SKIN_FILES: [&str; 6] = [
    "upgradeskin.txt",
    "humanupgradefunc.txt",
    "neutralupgradefunc.txt",
    "nightelfupgradefunc.txt",
    "orcupgradefunc.txt",
    "undeadupgradefunc.txt",
];

/// The game's stock data: profile sections and SYLK tables
#[derive(Debug, Clone, Default)]
pub struct Baseline {
    pub unit_skins: ProfileTable,
    pub unit_strings: ProfileTable,
    pub upgrade_skins: ProfileTable,
    pub ability_skins: ProfileTable,
    pub item_skins: ProfileTable,
    pub unit_balance: SideTable,
    pub unit_weapons: SideTable,
    pub unit_data: SideTable,
    pub upgrade_data: SideTable,
}

impl Baseline {
    /// Load every baseline file from `dir`; missing files are empty tables
    pub fn load(dir: &Path) -> Result<Self> {
        let unit_skin_keys: Vec<&str> = ART_KEYS
            .into_iter()
            .chain(["file", "file:sd", "file:hd"])
            .collect();

        let mut unit_strings = ProfileTable::default();
        for file in UNIT_STRING_FILES {
            unit_strings.extend(ProfileTable::load(&dir.join(file), Some(["name", "propernames"].as_slice()))?);
        }

        let mut upgrade_skins = ProfileTable::default();
        for file in UPGRADE_SKIN_FILES {
            upgrade_skins.extend(ProfileTable::load(&dir.join(file), Some(ART_KEYS.as_slice()))?);
        }

        let baseline = Self {
            unit_skins: ProfileTable::load(&dir.join("unitskin.txt"), Some(unit_skin_keys.as_slice()))?,
            unit_strings,
            upgrade_skins,
            ability_skins: ProfileTable::load(&dir.join("abilityskin.txt"), Some(ART_KEYS.as_slice()))?,
            item_skins: ProfileTable::load(&dir.join("itemfunc.txt"), Some(ART_KEYS.as_slice()))?,
            unit_balance: load_side(dir, "unitbalance.slk", "unitBalanceID")?,
            unit_weapons: load_side(dir, "unitweapons.slk", "unitWeapID")?,
            unit_data: load_side(dir, "unitdata.slk", "unitID")?,
            upgrade_data: load_side(dir, "upgradedata.slk", "upgradeid")?,
        };

        info!(
            "Loaded baseline data: {} unit skins, {} upgrade skins, {} ability skins, {} unit rows",
            baseline.unit_skins.len(),
            baseline.upgrade_skins.len(),
            baseline.ability_skins.len(),
            baseline.unit_balance.len()
        );
        Ok(baseline)
    }
}

fn load_side(dir: &Path, file: &str, id_column: &str) -> Result<SideTable> {
    let path = dir.join(file);
    if !path.exists() {
        warn!("SYLK table {} not found", path.display());
        return Ok(SideTable::default());
    }
    Ok(SideTable::load(&path, id_column)?)
}

/// The four object tables of one map, ready for extraction
///
/// Built once before any object is assembled and never mutated afterwards.
#[derive(Debug)]
pub struct Catalog {
    units: EntityRawTable,
    items: EntityRawTable,
    abilities: EntityRawTable,
    upgrades: EntityRawTable,
    baseline: Baseline,
    patches: PatchTable,
}

impl Catalog {
    pub fn new(
        units: EntityRawTable,
        items: EntityRawTable,
        abilities: EntityRawTable,
        upgrades: EntityRawTable,
        baseline: Baseline,
        patches: PatchTable,
    ) -> Self {
        Self {
            units,
            items,
            abilities,
            upgrades,
            baseline,
            patches,
        }
    }

    /// Load all four categories through `store`
    pub fn load<S: TableSource>(
        store: &RawTableStore<S>,
        baseline: Baseline,
        patches: PatchTable,
    ) -> Result<Self> {
        Ok(Self::new(
            store.load(Category::Units)?,
            store.load(Category::Items)?,
            store.load(Category::Abilities)?,
            store.load(Category::Upgrades)?,
            baseline,
            patches,
        ))
    }

    pub fn table(&self, category: Category) -> &EntityRawTable {
        match category {
            Category::Units => &self.units,
            Category::Items => &self.items,
            Category::Abilities => &self.abilities,
            Category::Upgrades => &self.upgrades,
        }
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    pub fn patches(&self) -> &PatchTable {
        &self.patches
    }

    /// Apply the manual correction for `id`, if any
    pub fn patch<T>(&self, id: &str, object: T) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
    {
        Ok(self.patches.apply(id, object)?)
    }

    pub fn units(&self) -> Units<'_> {
        Units::new(self)
    }

    pub fn abilities(&self) -> Abilities<'_> {
        Abilities::new(self)
    }

    pub fn upgrades(&self) -> Upgrades<'_> {
        Upgrades::new(self)
    }

    pub fn items(&self) -> Items<'_> {
        Items::new(self)
    }
}

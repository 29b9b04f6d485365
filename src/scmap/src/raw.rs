//! Unassembled race data as mined from the script
//!
//! Everything here is an entity id (or a list of them); the assembler turns
//! ids into objects.

use crate::objects::{BaseUpgrades, CombineMap, RaceBuildings, RaceUltimateData, RaceUnits};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A hero granted by a bonus, shown in a fixed hotkey slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusHero {
    pub slot: usize,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRace {
    pub name: String,
    pub key: String,
    pub id: String,
    pub bonuses: Vec<String>,
    /// Tower upgrades, in grade order
    pub upgrades: Vec<String>,
    pub magic: String,
    pub base_upgrades: BaseUpgrades<String>,
    pub auras: Vec<String>,
    pub t1spell: String,
    pub t2spell: String,
    pub heroes: Vec<String>,
    pub buildings: RaceBuildings<String>,
    pub units: RaceUnits<String>,
    /// Bonus id to (upgrade id, starting level)
    pub bonus_upgrades: IndexMap<String, Vec<(String, u32)>>,
    pub bonus_heroes: Vec<BonusHero>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ulti_data: Option<RaceUltimateData>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawUltimates {
    pub pickers: Vec<String>,
    /// Picker id to the spells it grants
    pub spells: IndexMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArtifacts {
    pub combine_map: CombineMap,
    pub list: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawMisc {
    pub neutrals: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shrines: Option<Vec<String>>,
}

/// Everything one miner pass produces
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawPatchData {
    /// Alliance picker id to the race ids it offers
    pub pickers: IndexMap<String, Vec<String>>,
    pub races: Vec<RawRace>,
    pub ultimates: RawUltimates,
    pub artifacts: RawArtifacts,
    pub misc: RawMisc,
}

impl RawPatchData {
    pub fn race(&self, id: &str) -> Option<&RawRace> {
        self.races.iter().find(|r| r.id == id)
    }
}

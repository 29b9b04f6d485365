//! Output document types
//!
//! Field names and shapes are what the race browser reads, so everything
//! serializes camelCase with a `type` discriminator. Values passed through
//! from the tables untouched keep their table type ([`Value`]).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use w3data::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectKind {
    Race,
    Unit,
    Hero,
    Spell,
    Upgrade,
    Artifact,
    Bonus,
    Aura,
    Building,
    UltiPicker,
    Ultimate,
    Neutral,
    NeutralSpell,
}

/// Common shape for auras, bonus buildings and neutral skills
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicObject {
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icons_count: Option<usize>,
}

impl BasicObject {
    pub fn new(kind: ObjectKind, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            name: name.into(),
            hotkey: None,
            description: None,
            icons_count: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RacePickerObject {
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub id: String,
    pub name: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitObject {
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp_reg: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mp: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mp_reg: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub def: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub def_type: Option<Value>,
    pub atk: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atk_type: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atk_range: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atk_speed: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon_type: Option<Value>,
    #[serde(default)]
    pub upgrades: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<SpellObject>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounty: Option<Value>,
}

/// A hero: the unit fields plus attributes and items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroObject {
    #[serde(flatten)]
    pub unit: UnitObject,
    pub full_name: String,
    /// Primary attribute: `str`, `agi` or `int`
    pub stat: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub str: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agi: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub int: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub str_lvl: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agi_lvl: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub int_lvl: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ArtifactObject>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellObject {
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<String>>,
    #[serde(default)]
    pub summon_unit: Vec<UnitObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icons_count: Option<usize>,
}

impl SpellObject {
    /// Whether the spell has a name and any numbers worth showing
    pub fn is_meaningful(&self) -> bool {
        let has_numbers = [&self.area, &self.cooldown, &self.cost, &self.duration]
            .into_iter()
            .any(|list| list.as_ref().is_some_and(|l| !l.is_empty()));
        !self.name.is_empty() && (has_numbers || !self.summon_unit.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeObject {
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icons_count: Option<usize>,
    pub cost: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timers: Option<Vec<f64>>,
    #[serde(default)]
    pub spells: Vec<SpellObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactObject {
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusObject {
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub building_id: String,
    #[serde(rename = "relatedID", default)]
    pub related_id: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<Vec<UnitObject>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spells: Option<Vec<SpellObject>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrades: Option<Vec<UpgradeObject>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heroes: Option<Vec<HeroObject>>,
}

/// Race ultimate metadata mined from the script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceUltimateData {
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_time: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steal_interrupt: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fake_steal_interrupt: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BaseUpgrades<T> {
    pub melee: T,
    pub armor: T,
    pub range: T,
    pub wall: T,
}

impl<T> BaseUpgrades<T> {
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> BaseUpgrades<U> {
        BaseUpgrades {
            melee: f(self.melee),
            armor: f(self.armor),
            range: f(self.range),
            wall: f(self.wall),
        }
    }

    pub fn try_map<U, E>(self, mut f: impl FnMut(T) -> Result<U, E>) -> Result<BaseUpgrades<U>, E> {
        Ok(BaseUpgrades {
            melee: f(self.melee)?,
            armor: f(self.armor)?,
            range: f(self.range)?,
            wall: f(self.wall)?,
        })
    }

    /// Combine slot by slot with `other`
    pub fn zip_with<U, V>(self, other: BaseUpgrades<U>, mut f: impl FnMut(T, U) -> V) -> BaseUpgrades<V> {
        BaseUpgrades {
            melee: f(self.melee, other.melee),
            armor: f(self.armor, other.armor),
            range: f(self.range, other.range),
            wall: f(self.wall, other.wall),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RaceUnits<T> {
    pub melee: T,
    pub range: T,
    pub mage: T,
    pub siege: T,
    pub air: T,
    pub catapult: T,
}

impl<T> RaceUnits<T> {
    /// Slots in output order
    pub fn slots(&self) -> [(&'static str, &T); 6] {
        [
            ("melee", &self.melee),
            ("range", &self.range),
            ("mage", &self.mage),
            ("siege", &self.siege),
            ("air", &self.air),
            ("catapult", &self.catapult),
        ]
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> RaceUnits<U> {
        RaceUnits {
            melee: f(self.melee),
            range: f(self.range),
            mage: f(self.mage),
            siege: f(self.siege),
            air: f(self.air),
            catapult: f(self.catapult),
        }
    }

    pub fn try_map<U, E>(self, mut f: impl FnMut(T) -> Result<U, E>) -> Result<RaceUnits<U>, E> {
        Ok(RaceUnits {
            melee: f(self.melee)?,
            range: f(self.range)?,
            mage: f(self.mage)?,
            siege: f(self.siege)?,
            air: f(self.air)?,
            catapult: f(self.catapult)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RaceBuildings<T> {
    pub fort: T,
    pub tower: T,
    pub barrack: T,
}

impl<T> RaceBuildings<T> {
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> RaceBuildings<U> {
        RaceBuildings {
            fort: f(self.fort),
            tower: f(self.tower),
            barrack: f(self.barrack),
        }
    }

    pub fn try_map<U, E>(self, mut f: impl FnMut(T) -> Result<U, E>) -> Result<RaceBuildings<U>, E> {
        Ok(RaceBuildings {
            fort: f(self.fort)?,
            tower: f(self.tower)?,
            barrack: f(self.barrack)?,
        })
    }
}

/// Everything the race page shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceData {
    pub name: String,
    pub key: String,
    pub id: String,
    pub description: String,
    pub auras: Vec<BasicObject>,
    pub bonuses: Vec<BonusObject>,
    pub tower_upgrades: Vec<UpgradeObject>,
    pub magic: Vec<UpgradeObject>,
    pub base_upgrades: BaseUpgrades<UpgradeObject>,
    pub units: RaceUnits<UnitObject>,
    pub buildings: RaceBuildings<UnitObject>,
    pub t1spell: SpellObject,
    pub t2spell: SpellObject,
    pub heroes: Vec<HeroObject>,
    pub bonus_buildings: Vec<BasicObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ulti_data: Option<RaceUltimateData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UltimatePicker {
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Required upgrade id to required level
    pub requires: IndexMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UltimatesData {
    pub pickers: Vec<UltimatePicker>,
    pub spells: IndexMap<String, Vec<SpellObject>>,
    /// Requirement upgrade id to display name
    pub requires: IndexMap<String, String>,
}

/// Artifact result id to its alternative ingredient lists
pub type CombineMap = IndexMap<String, Vec<Vec<String>>>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactData {
    pub items: Vec<ArtifactObject>,
    pub combine_map: CombineMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeutralData {
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<String>,
    pub skills: Vec<BasicObject>,
}

/// Gold bounty per unit slot of one race
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounty {
    pub melee: Option<Value>,
    pub range: Option<Value>,
    pub mage: Option<Value>,
    pub siege: Option<Value>,
    pub air: Option<Value>,
    pub catapult: Option<Value>,
    pub hero: Option<Value>,
    pub su: Option<Value>,
    pub tower: Option<Value>,
    pub fort: Option<Value>,
    pub barracks: Vec<Value>,
    pub summon: Vec<Option<Value>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiscData {
    pub neutrals: Vec<NeutralData>,
    pub damage: crate::misc::DamageTable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shrines: Option<Vec<SpellObject>>,
    pub bounty: IndexMap<String, Bounty>,
}

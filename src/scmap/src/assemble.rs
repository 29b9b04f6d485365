//! Turns mined ids into the output documents
//!
//! Every document comes with the icons of the entities it mentions, keyed
//! by entity id. A missing icon is logged and skipped; a missing required
//! entity (tower upgrade, base upgrade, building, unit, tier spell) aborts
//! the race.

use crate::catalog::{Catalog, IconMap};
use crate::categories::CategoryRules;
use crate::misc::{race_bounty, DamageTable};
use crate::objects::{
    ArtifactData, ArtifactObject, BasicObject, BonusObject, HeroObject, MiscData, NeutralData,
    ObjectKind, RaceData, RacePickerObject, SpellObject, UltimatePicker, UltimatesData,
    UnitObject, UpgradeObject,
};
use crate::raw::{RawArtifacts, RawPatchData, RawRace, RawUltimates};
use crate::script::ScriptMiner;
use crate::variant::MapVariant;
use crate::{Error, Result};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use w3data::{model_hash, Category, EntityView};

/// Hotkey grid, in slot order
pub const HOTKEYS: [&str; 12] = ["Q", "W", "E", "R", "A", "S", "D", "F", "Z", "X", "C", "V"];

static PARENTHESIZED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.*?\)").unwrap());
static LEVEL_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"lv\d+").unwrap());
static TRAILING_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\w+\)$").unwrap());

/// One output document and the icons it references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFile<T> {
    pub data: T,
    pub icons: IconMap,
}

impl<T> DataFile<T> {
    pub fn new(data: T, icons: IconMap) -> Self {
        Self { data, icons }
    }
}

/// Race pickers grouped by alliance name
pub type RaceIndex = IndexMap<String, Vec<RacePickerObject>>;

/// Every document of one extraction pass
#[derive(Debug, Clone)]
pub struct Extraction {
    pub races: DataFile<RaceIndex>,
    /// One document per race, in picker order
    pub race_files: Vec<DataFile<RaceData>>,
    pub ultimates: DataFile<UltimatesData>,
    pub artifacts: DataFile<ArtifactData>,
    pub misc: DataFile<MiscData>,
    /// What the miner produced before assembly
    pub raw: RawPatchData,
}

/// Record an icon, logging entities that have none
fn add_icon<'c>(rules: &impl CategoryRules<'c>, view: &EntityView<'_>, icons: &mut IconMap) {
    if let Err(e) = rules.register_icon(view, icons) {
        warn!("{}", e);
    }
}

pub struct Assembler<'a> {
    catalog: &'a Catalog,
    miner: Box<dyn ScriptMiner + 'a>,
    damage: DamageTable,
}

impl<'a> Assembler<'a> {
    pub fn new(catalog: &'a Catalog, miner: Box<dyn ScriptMiner + 'a>, damage: DamageTable) -> Self {
        Self {
            catalog,
            miner,
            damage,
        }
    }

    pub fn variant(&self) -> MapVariant {
        self.miner.variant()
    }

    /// Mine the script and assemble every document
    pub fn run(&self) -> Result<Extraction> {
        let raw = self.miner.patch_data()?;
        info!(
            "Assembling {} races for {}",
            raw.races.len(),
            self.variant()
        );

        let (races, race_files) = self.races(&raw)?;
        let ultimates = self.ultimates(&raw.ultimates)?;
        let artifacts = self.artifacts(&raw.artifacts)?;
        let race_data: Vec<&RaceData> = race_files.iter().map(|file| &file.data).collect();
        let misc = self.misc(&raw, &race_data)?;

        Ok(Extraction {
            races,
            race_files,
            ultimates,
            artifacts,
            misc,
            raw,
        })
    }

    /// Rules for the table holding race pickers
    fn picker_rules(&self) -> Box<dyn CategoryRules<'a> + 'a> {
        match self.variant().picker_category() {
            Category::Abilities => Box::new(self.catalog.abilities()),
            _ => Box::new(self.catalog.units()),
        }
    }

    fn races(&self, raw: &RawPatchData) -> Result<(DataFile<RaceIndex>, Vec<DataFile<RaceData>>)> {
        let pickers = self.picker_rules();
        let mut icons = IconMap::new();
        let mut index = RaceIndex::new();
        let mut race_files = Vec::new();

        for (alliance_id, race_ids) in &raw.pickers {
            let alliance = pickers
                .get(alliance_id)
                .map(|view| pickers.display_name(&view, None))
                .unwrap_or_default();

            let mut entries = Vec::new();
            for race_id in race_ids {
                let picker = pickers.get(race_id);
                if let Some(view) = &picker {
                    pickers.register_icon_silent(view, &mut icons);
                }
                let Some(raw_race) = raw.race(race_id) else {
                    debug!("Picker {} has no mined race", race_id);
                    continue;
                };

                let description = match (self.variant(), &picker) {
                    (MapVariant::Oz, Some(view)) => format!(
                        "{}<br/>{}",
                        pickers.display_name(view, None),
                        view.text("ub1", None).unwrap_or_default()
                    ),
                    (MapVariant::Og, Some(view)) => view.text("tub", None).unwrap_or_default(),
                    (_, None) => String::new(),
                };

                let race = self.race(raw_race, description.clone())?;
                entries.push(RacePickerObject {
                    kind: ObjectKind::Race,
                    id: race_id.clone(),
                    name: race.data.name.clone(),
                    key: race.data.key.clone(),
                    hotkey: picker.as_ref().and_then(|view| view.text("hot", None)),
                    description,
                });
                race_files.push(race);
            }
            index.insert(alliance, entries);
        }

        Ok((DataFile::new(index, icons), race_files))
    }

    fn race(&self, raw: &RawRace, description: String) -> Result<DataFile<RaceData>> {
        let units = self.catalog.units();
        let abilities = self.catalog.abilities();
        let upgrades = self.catalog.upgrades();
        let mut icons = IconMap::new();

        if let Some(view) = raw.ulti_data.as_ref().and_then(|ulti| abilities.get(&ulti.id)) {
            add_icon(&abilities, &view, &mut icons);
        }

        let mut bonus_buildings: Vec<BasicObject> = Vec::new();
        for view in raw.bonuses.iter().filter_map(|id| units.get(id)) {
            let building_id = model_hash(&units.model(&view).unwrap_or_default());
            if bonus_buildings.iter().any(|b| b.id == building_id) {
                continue;
            }
            let mut building = BasicObject::new(ObjectKind::Building, building_id, units.display_name(&view, None));
            building.hotkey = Some(String::new());
            bonus_buildings.push(building);
        }

        let mut auras = Vec::new();
        for (idx, id) in raw.auras.iter().enumerate() {
            let Some(view) = abilities.get(id) else {
                continue;
            };
            add_icon(&abilities, &view, &mut icons);
            let mut aura = BasicObject::new(ObjectKind::Aura, id.as_str(), abilities.display_name(&view, None));
            aura.description = view.text("ub1", None);
            aura.hotkey = HOTKEYS.get(idx).map(|key| key.to_string());
            auras.push(aura);
        }

        let mut bonuses = Vec::new();
        for id in &raw.bonuses {
            if let Some(bonus) = self.bonus(id, &mut icons)? {
                bonuses.push(bonus);
            }
        }

        let tower_upgrades = self.tower_upgrades(raw, &mut icons)?;

        let mut tier_spell = |id: &str, field: &str| -> Result<SpellObject> {
            let view = abilities
                .get(id)
                .ok_or_else(|| Error::missing("race", raw.id.as_str(), field))?;
            add_icon(&abilities, &view, &mut icons);
            abilities.spell_object(&view, Some(&mut icons))
        };
        let t1spell = tier_spell(&raw.t1spell, "t1spell")?;
        let t2spell = tier_spell(&raw.t2spell, "t2spell")?;

        let buildings = raw.buildings.clone().try_map(|id| self.roster_unit(&id, "building", &raw.id, &mut icons))?;
        let race_units = raw.units.clone().try_map(|id| self.roster_unit(&id, "unit", &raw.id, &mut icons))?;

        let heroes = self.heroes(raw, &mut icons)?;
        let magic = self.magic(raw, &mut icons)?;

        let base_upgrades = raw.base_upgrades.clone().try_map(|id| {
            let view = upgrades
                .get(&id)
                .ok_or_else(|| Error::missing("race", raw.id.as_str(), format!("base upgrade {id}")))?;
            add_icon(&upgrades, &view, &mut icons);
            upgrades.upgrade_object(&view, Some(&mut icons))
        })?;

        let data = RaceData {
            name: raw.name.clone(),
            key: raw.key.clone(),
            id: raw.id.clone(),
            description,
            auras,
            bonuses,
            tower_upgrades,
            magic,
            base_upgrades,
            units: race_units,
            buildings,
            t1spell,
            t2spell,
            heroes,
            bonus_buildings,
            ulti_data: raw.ulti_data.clone(),
        };
        debug!("Assembled race {} with {} icons", data.key, icons.len());
        Ok(DataFile::new(data, icons))
    }

    /// Building or unit a race cannot go without
    fn roster_unit(&self, id: &str, field: &str, race_id: &str, icons: &mut IconMap) -> Result<UnitObject> {
        let units = self.catalog.units();
        let view = units
            .get(id)
            .ok_or_else(|| Error::missing("race", race_id, format!("{field} {id}")))?;
        add_icon(&units, &view, icons);
        self.miner.enrich_unit_requires(units.unit_object(&view)?)
    }

    /// Tower upgrades without their last grade, which is never researchable
    fn tower_upgrades(&self, raw: &RawRace, icons: &mut IconMap) -> Result<Vec<UpgradeObject>> {
        let upgrades = self.catalog.upgrades();
        let mut found = Vec::with_capacity(raw.upgrades.len());
        for view in raw.upgrades.iter().filter_map(|id| upgrades.get(id)) {
            add_icon(&upgrades, &view, icons);
            let mut upgrade = upgrades.upgrade_object(&view, Some(&mut *icons))?;
            upgrade.cost.pop();
            if let Some(timers) = upgrade.timers.as_mut() {
                timers.pop();
            }
            found.push(upgrade);
        }

        if found.len() != raw.upgrades.len() {
            let missing: Vec<&str> = raw
                .upgrades
                .iter()
                .filter(|id| !found.iter().any(|u| &u.id == *id))
                .map(String::as_str)
                .collect();
            return Err(Error::missing(
                "race",
                raw.id.as_str(),
                format!("tower upgrades {}", missing.join(",")),
            ));
        }
        Ok(found)
    }

    /// Regular heroes take the grid slot of their position; bonus heroes
    /// their own slot and the items they unlock
    fn heroes(&self, raw: &RawRace, icons: &mut IconMap) -> Result<Vec<HeroObject>> {
        let units = self.catalog.units();
        let items = self.catalog.items();
        let mut heroes = Vec::new();

        let regular = raw.heroes.iter().filter_map(|id| units.get(id));
        for (idx, view) in regular.enumerate() {
            add_icon(&units, &view, icons);
            let mut hero = units.build_hero(&view)?;
            hero.unit.hotkey = HOTKEYS.get(idx).map(|key| key.to_string());
            heroes.push(self.catalog.patch(view.id(), hero)?);
        }

        for bonus_hero in &raw.bonus_heroes {
            let Some(view) = units.get(&bonus_hero.id) else {
                warn!("Bonus hero {} of {} not found", bonus_hero.id, raw.id);
                continue;
            };
            add_icon(&units, &view, icons);

            let hero_items = match self.miner.hero_items(&bonus_hero.id)? {
                Some(unlocks) => {
                    let mut artifacts: Vec<ArtifactObject> = Vec::new();
                    for (item_id, level) in unlocks {
                        let Some(item) = items.get(&item_id) else {
                            continue;
                        };
                        add_icon(&items, &item, icons);
                        artifacts.push(items.artifact_object(&item, Some(level))?);
                    }
                    Some(artifacts)
                }
                None => None,
            };

            let mut hero = units.build_hero(&view)?;
            hero.unit.hotkey = HOTKEYS.get(bonus_hero.slot).map(|key| key.to_string());
            hero.items = hero_items;
            heroes.push(self.catalog.patch(view.id(), hero)?);
        }
        Ok(heroes)
    }

    /// The magic upgrade, one entry per grade
    fn magic(&self, raw: &RawRace, icons: &mut IconMap) -> Result<Vec<UpgradeObject>> {
        let upgrades = self.catalog.upgrades();
        let abilities = self.catalog.abilities();
        let Some(view) = upgrades.get(&raw.magic) else {
            warn!("Magic upgrade {:?} of {} not found", raw.magic, raw.id);
            return Ok(Vec::new());
        };
        add_icon(&upgrades, &view, icons);
        let base = upgrades.upgrade_object(&view, Some(&mut *icons))?;

        let spell_ids = self
            .catalog
            .table(Category::Abilities)
            .ids_by_value("req", view.id());

        let mut grades = Vec::new();
        for level in 1..=view.max_level() {
            let mut spells = Vec::new();
            for spell in spell_ids.iter().filter_map(|id| abilities.get(id)) {
                abilities.register_icon_silent(&spell, icons);
                spells.push(abilities.spell_object(&spell, Some(&mut *icons))?);
            }

            let idx = (level - 1) as usize;
            grades.push(UpgradeObject {
                name: view
                    .text("tp1", Some(level))
                    .unwrap_or_else(|| base.name.clone()),
                description: view
                    .text("ub1", Some(level))
                    .or_else(|| base.description.clone()),
                cost: base.cost.get(idx).copied().into_iter().collect(),
                level: Some(level),
                spells,
                ..base.clone()
            });
        }
        Ok(grades)
    }

    fn bonus(&self, bonus_id: &str, icons: &mut IconMap) -> Result<Option<BonusObject>> {
        let units = self.catalog.units();
        let abilities = self.catalog.abilities();
        let upgrades = self.catalog.upgrades();
        let Some(view) = units.get(bonus_id) else {
            return Ok(None);
        };
        add_icon(&units, &view, icons);

        let related_id = self
            .catalog
            .table(Category::Upgrades)
            .ids_by_value("req", bonus_id);

        let unit = match self.miner.bonus_unit(bonus_id)?.and_then(|id| units.get(&id)) {
            Some(unit) => {
                add_icon(&units, &unit, icons);
                Some(self.miner.enrich_unit_requires(units.unit_object(&unit)?)?)
            }
            None => None,
        };

        // A single ability is the building's own passive
        let skills: Vec<_> = view
            .array("abi", None)
            .unwrap_or_default()
            .iter()
            .filter_map(|id| abilities.get(id))
            .collect();
        let spells = if skills.len() > 1 {
            let mut spells = Vec::with_capacity(skills.len());
            for skill in &skills {
                abilities.register_icon_silent(skill, icons);
                spells.push(abilities.spell_object(skill, Some(&mut *icons))?);
            }
            Some(spells)
        } else {
            None
        };

        let researches = match view.array("res", None) {
            Some(ids) => {
                let mut researches = Vec::new();
                for research in ids.iter().filter_map(|id| upgrades.get(id)) {
                    add_icon(&upgrades, &research, icons);
                    researches.push(upgrades.upgrade_object(&research, Some(&mut *icons))?);
                }
                Some(researches)
            }
            None => None,
        };

        let bonus = BonusObject {
            kind: ObjectKind::Bonus,
            id: bonus_id.to_string(),
            name: view.text("tip", None).unwrap_or_default(),
            hotkey: view.text("hot", None),
            description: view.text("tub", None),
            building_id: model_hash(&units.model(&view).unwrap_or_default()),
            related_id,
            units: unit.map(|unit| vec![unit]),
            spells,
            upgrades: researches,
            heroes: None,
        };
        Ok(Some(self.catalog.patch(bonus_id, bonus)?))
    }

    fn ultimates(&self, raw: &RawUltimates) -> Result<DataFile<UltimatesData>> {
        let abilities = self.catalog.abilities();
        let upgrades = self.catalog.upgrades();
        let mut icons = IconMap::new();
        let mut requires: IndexMap<String, String> = IndexMap::new();

        let mut pickers = Vec::with_capacity(raw.pickers.len());
        for id in &raw.pickers {
            let Some(view) = abilities.get(id) else {
                warn!("Ultimate picker {} not found", id);
                continue;
            };
            add_icon(&abilities, &view, &mut icons);

            let levels = view.array("rqa", None).unwrap_or_default();
            let mut picker_requires = IndexMap::new();
            for (idx, upgrade_id) in view.array("req", None).unwrap_or_default().into_iter().enumerate() {
                if !requires.contains_key(&upgrade_id) {
                    let name = upgrades
                        .get(&upgrade_id)
                        .and_then(|upgrade| upgrade.raw_text("nam", Some(1)))
                        .unwrap_or_default();
                    let name = PARENTHESIZED.replace_all(&name, "");
                    let name = LEVEL_SUFFIX.replace_all(&name, "").trim().to_string();
                    requires.insert(upgrade_id.clone(), name);
                }
                let level = levels
                    .get(idx)
                    .and_then(|level| level.parse::<f64>().ok())
                    .unwrap_or(0.0);
                picker_requires.insert(upgrade_id, level);
            }

            pickers.push(UltimatePicker {
                kind: ObjectKind::UltiPicker,
                id: id.clone(),
                name: view
                    .text("tp1", None)
                    .unwrap_or_else(|| abilities.display_name(&view, None)),
                hotkey: view.text("hky", None),
                description: view.text("ub1", None),
                requires: picker_requires,
            });
        }

        let mut spells = IndexMap::new();
        for (picker, spell_ids) in &raw.spells {
            let mut objects = Vec::new();
            for view in spell_ids.iter().filter_map(|id| abilities.get(id)) {
                add_icon(&abilities, &view, &mut icons);
                objects.push(abilities.spell_object(&view, Some(&mut icons))?);
            }
            spells.insert(picker.clone(), objects);
        }

        info!("Assembled {} ultimate pickers", pickers.len());
        Ok(DataFile::new(
            UltimatesData {
                pickers,
                spells,
                requires,
            },
            icons,
        ))
    }

    fn artifacts(&self, raw: &RawArtifacts) -> Result<DataFile<ArtifactData>> {
        let items = self.catalog.items();
        let mut icons = IconMap::new();
        let mut artifacts = Vec::with_capacity(raw.list.len());

        for id in &raw.list {
            let Some(view) = items.get(id) else {
                warn!("Artifact {} not found", id);
                continue;
            };
            add_icon(&items, &view, &mut icons);
            artifacts.push(items.artifact_object(&view, items.level(&view))?);
        }

        info!("Assembled {} artifacts", artifacts.len());
        Ok(DataFile::new(
            ArtifactData {
                items: artifacts,
                combine_map: raw.combine_map.clone(),
            },
            icons,
        ))
    }

    fn misc(&self, raw: &RawPatchData, races: &[&RaceData]) -> Result<DataFile<MiscData>> {
        let units = self.catalog.units();
        let abilities = self.catalog.abilities();
        let mut icons = IconMap::new();

        let shrines = match &raw.misc.shrines {
            Some(ids) => {
                let mut shrines = Vec::new();
                for view in ids.iter().filter_map(|id| abilities.get(id)) {
                    add_icon(&abilities, &view, &mut icons);
                    shrines.push(abilities.spell_object(&view, Some(&mut icons))?);
                }
                Some(shrines)
            }
            None => None,
        };

        let mut neutrals = Vec::new();
        for view in raw.misc.neutrals.iter().filter_map(|id| units.get(id)) {
            let mut skills = Vec::new();
            for skill in view
                .array("abi", None)
                .unwrap_or_default()
                .iter()
                .filter_map(|id| abilities.get(id))
            {
                add_icon(&abilities, &skill, &mut icons);
                let name = abilities.display_name(&skill, None);
                let description = skill
                    .all_values_by("ub1", |record| (1..=3).contains(&record.level))
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("<hr/>");

                let mut object = BasicObject::new(
                    ObjectKind::NeutralSpell,
                    skill.id(),
                    TRAILING_TAG.replace(&name, ""),
                );
                object.description = Some(description);
                object.hotkey = skill.text("hky", None);
                skills.push(object);
            }

            neutrals.push(NeutralData {
                kind: ObjectKind::Neutral,
                id: view.id().to_string(),
                name: units.display_name(&view, None),
                hotkey: Some(String::new()),
                skills,
            });
        }

        let bounty = races
            .iter()
            .map(|race| (race.id.clone(), race_bounty(self.catalog, race)))
            .collect();

        Ok(DataFile::new(
            MiscData {
                neutrals,
                damage: self.damage,
                shrines,
                bounty,
            },
            icons,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_name_cleanup() {
        let name = "Ultimate Power (Tier 2) lv3";
        let name = PARENTHESIZED.replace_all(name, "");
        let name = LEVEL_SUFFIX.replace_all(&name, "");
        assert_eq!(name.trim(), "Ultimate Power");
    }

    #[test]
    fn test_neutral_skill_tag() {
        assert_eq!(TRAILING_TAG.replace("Slam(Neutral)", ""), "Slam");
        assert_eq!(TRAILING_TAG.replace("Slam (big) hit", ""), "Slam (big) hit");
    }

    #[test]
    fn test_data_file_shape() {
        let mut icons = IconMap::new();
        icons.insert("A000".to_string(), "icon.blp".to_string());
        let file = DataFile::new(vec![1, 2], icons);
        assert_eq!(
            serde_json::to_value(&file).unwrap(),
            serde_json::json!({ "data": [1, 2], "icons": { "A000": "icon.blp" } })
        );
    }
}

//! Miner for the classic map
//!
//! Ids are quoted literals (`'h001'`). Races are sold by four alliance shops;
//! buying one runs a trigger that swaps in the race's fort and fills a set of
//! global arrays with the race's unit, upgrade and hero ids.

use super::{
    all_captures, alternation, block_at, combine_list, dedup_in_order, first_capture, pattern,
    push_unique, HeroItems, ScriptMiner,
};
use crate::catalog::Catalog;
use crate::categories::CategoryRules;
use crate::objects::{BaseUpgrades, CombineMap, ObjectKind, RaceBuildings, RaceUltimateData, UnitObject};
use crate::raw::{BonusHero, RawArtifacts, RawMisc, RawPatchData, RawRace, RawUltimates};
use crate::variant::MapVariant;
use crate::{Error, Result};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use w3data::{parse_jass_int, ScriptText, Value};

/// Neutral shops, one per alliance, stocking race pickers
const ALLIANCES: [&str; 4] = ["nfh1", "nfr2", "nfr1", "ngnh"];

/// Ability listing the ultimate pickers
const ULTIMATE_PICKER: &str = "A0OA";

const DEFAULT_ULTIMATE_NAME: &str = "Precision UW";
const ULTIMATE_HOTKEY: &str = "V";

/// Granted together with a race's decoy ultimate
const MANA_BURN: &str = "A0QV";

/// Orders that interrupt channeling when the ultimate's dummy casts them
const INTERRUPT_ORDERS: [&str; 7] = [
    "thunderbolt",
    "entanglingroots",
    "entangle",
    "freezy",
    "freezyon",
    "silence",
    "stop",
];

/// Hotkey slot a bonus hero replaces
const BONUS_HERO_SLOT: usize = 4;

/// Spawned as neutrals but never shown
const IGNORED_NEUTRALS: [&str; 1] = ["nmoo"];

/// Heroes granted outside the usual level trigger
const FIXED_HERO_ITEMS: [(&str, &[(&str, u32)]); 3] = [
    (
        "U00N",
        &[("mlst", 2), ("sbch", 3), ("I000", 4), ("gvsm", 5), ("shhn", 6), ("esaz", 7)],
    ),
    (
        "N00T",
        &[("I000", 2), ("stwa", 3), ("axas", 4), ("shen", 5), ("mlst", 6), ("esaz", 7)],
    ),
    ("H04G", &[("I005", 4), ("I006", 8), ("I007", 14), ("I008", 20)]),
];

/// Global arrays the race trigger fills, and the slots read from them
mod vars {
    use crate::objects::RaceUnits;

    /// Bonus picker building per race, stored at map init
    pub const BONUS_PICKER_MAP: &str = "O2Q";

    pub const RACE_NAME: &str = "OQ";
    pub const FULL_NAME: &str = "30";
    pub const SHORT_NAME: &str = "38";

    pub const REPLACEABLE: &str = "I0Q";
    pub const AURA: &str = "1";
    pub const ULTIMATE: &str = "5";
    pub const DESCRIPTION: &str = "38";

    pub const UPGRADES: &str = "I2Q";
    pub const MELEE: &str = "$D";
    pub const RANGE: &str = "17";
    pub const MAGIC: &str = "5";
    pub const ARMOR: &str = "1";
    pub const WALL: &str = "9";
    pub const TOWER_UPGRADES: [&str; 9] = ["21", "25", "29", "33", "37", "41", "45", "49", "53"];
    pub const BONUS_UPGRADES: [&str; 3] = ["61", "65", "69"];

    pub const TOWER: &str = "I1";
    pub const BARRACK: &str = "Q1";
    pub const BUILDING_SLOT: &str = "1";
    /// The fort variable of the buying player
    pub const FORT_SLOT: &str = "[1]";

    pub const UNIT_SLOT: &str = "1";
    pub const UNITS: RaceUnits<&str> = RaceUnits {
        melee: "QO",
        range: "OO",
        mage: "IO",
        siege: "QI",
        air: "Q6",
        catapult: "O6",
    };

    pub const HEROES: [&str; 4] = ["Q2", "O2", "I2", "Q3"];
}

/// `array -> slot -> value` from `set array[slot]=...'value'` lines
type ArrayVars = HashMap<String, IndexMap<String, String>>;

static BUILDING_SET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?mi)^set ([^\[\n]*?)\[(.*?)\].*?['"](.{4})['"]$"#).unwrap());
static ARRAY_SET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?mi)^set ([^\[\n]*?)\[(.*?)\].*?['"](.*?)['"]$"#).unwrap());
static ULTIMATE_GRANT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(?:call UnitAddAbilityBJ\('|call BlzUnitHideAbility\(GetTriggerUnit\(\),')(\w+)'").unwrap()
});
static ARTIFACT_RECIPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)call AddSpecialEffectTargetUnitBJ.+\ncall RemoveItem\(GetItemOfTypeFromUnitBJ[\s\S]*?call UnitAddItemByIdSwapped.+$",
    )
    .unwrap()
});
static ARTIFACT_RESULT: Lazy<Regex> = Lazy::new(|| Regex::new(r"call UnitAddItemByIdSwapped\('(\w+)").unwrap());
static ARTIFACT_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"call RemoveItem\(GetItemOfTypeFromUnitBJ\(GetTriggerUnit\(\),'(\w+)").unwrap()
});
static NEUTRAL_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)call SetUnitColor\((.+),ConvertPlayerColor\(8\)\)").unwrap());
static HERO_ITEM_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)if\(.+?\(\)\)\s?then\n(?:call SelectHeroSkill.+?$\n)+(?:^.+$\ncall UnitAddItemByIdSwapped.+\n^.+$\n)+",
    )
    .unwrap()
});
static CONDITION_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"if\((\w+)").unwrap());
static HERO_ITEM_GRANT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)if\((.+)\(.+\ncall UnitAddItemByIdSwapped\('(\w+)").unwrap());
static TECH_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"GetPlayerTechCountSimple\(['"](\w+)"#).unwrap());

/// The fort a race trigger swaps in
#[derive(Debug, Clone, PartialEq)]
struct FortSwap {
    /// Variable receiving the new fort unit
    var: String,
    id: String,
    /// Slot of the race in the init-time building arrays
    slot: String,
}

pub struct OgMiner<'a> {
    script: &'a ScriptText,
    catalog: &'a Catalog,
    buildings: ArrayVars,
    hero_items: IndexMap<String, HeroItems>,
}

impl<'a> OgMiner<'a> {
    pub fn new(script: &'a ScriptText, catalog: &'a Catalog) -> Result<Self> {
        let mut miner = Self {
            script,
            catalog,
            buildings: ArrayVars::new(),
            hero_items: IndexMap::new(),
        };
        miner.buildings = miner.building_map();
        miner.hero_items = miner.prepare_hero_items()?;
        debug!(
            "Indexed {} building arrays and {} hero item tables",
            miner.buildings.len(),
            miner.hero_items.len()
        );
        Ok(miner)
    }

    fn text(&self) -> &'a str {
        self.script.as_str()
    }

    /// Building ids written by the map init function
    fn building_map(&self) -> ArrayVars {
        let mut map = ArrayVars::new();
        let Some(init) = self.script.function_containing("call SetTimeOfDay(12.)") else {
            warn!("Map init function not found, no stored building ids");
            return map;
        };
        for caps in BUILDING_SET.captures_iter(init.text) {
            map.entry(caps[1].to_string())
                .or_default()
                .insert(caps[2].to_string(), caps[3].to_string());
        }
        map
    }

    /// Alliance shop id to the race pickers it stocks
    fn race_ids(&self) -> Result<IndexMap<String, Vec<String>>> {
        let text = self.text();
        let shops = pattern(&format!(
            r"(?mi)^set (.*?)=CreateUnit\(.*?,\s?'({})'.*$",
            alternation(ALLIANCES)
        ))?;
        let mut shop_vars: HashMap<String, String> = HashMap::new();
        for caps in shops.captures_iter(text) {
            shop_vars.insert(caps[2].to_string(), caps[1].to_string());
        }

        let mut races = IndexMap::new();
        for alliance in ALLIANCES {
            let ids = match shop_vars.get(alliance) {
                Some(var) => {
                    let stock = pattern(&format!(
                        r"(?m)^call AddUnitToStockBJ\('(.*)',\s?{}",
                        regex::escape(var)
                    ))?;
                    all_captures(&stock, text)
                }
                None => {
                    warn!("Alliance shop {} is never created", alliance);
                    Vec::new()
                }
            };
            races.insert(alliance.to_string(), ids);
        }
        Ok(races)
    }

    fn fort_swap(&self, condition: &str) -> Result<Option<FortSwap>> {
        let text = self.text();
        let temp_set = pattern(&format!(
            r"(?m)^if\({}\(\)\)then$\n^set (.*?)=(.*?)$",
            regex::escape(condition)
        ))?;
        let Some(caps) = temp_set.captures(text) else {
            return Ok(None);
        };
        let (temp_var, slot) = (&caps[1], &caps[2]);
        if slot.is_empty() {
            return Ok(None);
        }

        let replace = pattern(&format!(
            r"(?m)set (.*)=ReplaceUnitBJ\(.*?,(.*?)\[{}\],bj_UNIT_STATE_METHOD_DEFAULTS\)",
            regex::escape(temp_var)
        ))?;
        let Some(replaced) = replace.captures(text) else {
            return Ok(None);
        };
        let Some(id) = self.buildings.get(&replaced[2]).and_then(|slots| slots.get(slot)) else {
            return Ok(None);
        };

        Ok(Some(FortSwap {
            var: replaced[1].to_string(),
            id: id.clone(),
            slot: slot.to_string(),
        }))
    }

    fn race(&self, race_id: &str) -> Result<Option<RawRace>> {
        let text = self.text();
        let sold = pattern(&format!(
            r"(?mi)function (\w*?)\s.*\n.*GetSoldUnit\(\)\)=='{}",
            regex::escape(race_id)
        ))?;
        let conditions = all_captures(&sold, text);
        if conditions.is_empty() {
            return Ok(None);
        }

        // The buying player's own fort swap wins over the others
        let mut swaps = Vec::new();
        for condition in &conditions {
            swaps.push(self.fort_swap(condition)?);
        }
        let mut swaps = swaps.into_iter();
        let first = swaps.next().flatten();
        let fort = swaps.fold(first, |chosen, swap| match swap {
            Some(swap) if swap.var.contains(vars::FORT_SLOT) => Some(swap),
            _ => chosen,
        });
        let Some(fort) = fort else {
            return Ok(None);
        };

        let fort_check = pattern(&format!(
            r"(?mi)function (.*?)\s.*?$\n^return\(GetUnitTypeId\({}\)=='{}'\)",
            regex::escape(&fort.var),
            regex::escape(&fort.id)
        ))?;
        let race_checks = all_captures(&fort_check, text);
        if race_checks.is_empty() {
            return Ok(None);
        }

        let setup = pattern(&format!(
            r"(?mi)if\((?:{})\(\)\)then\n([\s\S]*?set {}\[{}\].*)$",
            alternation(&race_checks),
            vars::RACE_NAME,
            vars::SHORT_NAME
        ))?;
        let Some(block) = first_capture(&setup, text) else {
            return Ok(None);
        };
        let race_vars = array_vars(&block);
        let get = |array: &str, slot: &str| lookup(&race_vars, array, slot).unwrap_or_default().to_string();

        let abilities = self.catalog.abilities();
        let units = self.catalog.units();

        let name = lookup(&race_vars, vars::RACE_NAME, vars::FULL_NAME)
            .ok_or_else(|| Error::missing("race", race_id, "name"))?
            .to_string();
        let key = lookup(&race_vars, vars::RACE_NAME, vars::SHORT_NAME)
            .ok_or_else(|| Error::missing("race", race_id, "key"))?
            .to_lowercase();

        let auras = lookup(&race_vars, vars::REPLACEABLE, vars::AURA)
            .and_then(|id| abilities.get(id))
            .and_then(|aura| aura.array("pb1", None))
            .unwrap_or_default();

        let fort_skills = units
            .get(&fort.id)
            .and_then(|view| view.array("abi", None))
            .unwrap_or_default();
        let skill_on = |hotkey: &str| {
            fort_skills
                .iter()
                .find(|id| {
                    abilities
                        .get(id)
                        .and_then(|view| view.raw_text("hky", None))
                        .as_deref()
                        == Some(hotkey)
                })
                .cloned()
                .unwrap_or_default()
        };

        let bonuses = self
            .buildings
            .get(vars::BONUS_PICKER_MAP)
            .and_then(|slots| slots.get(&fort.slot))
            .and_then(|id| units.get(id))
            .and_then(|picker| picker.array("upt", None))
            .unwrap_or_default();

        let heroes = vars::HEROES
            .iter()
            .map(|array| {
                race_vars
                    .get(*array)
                    .and_then(first_slot)
                    .unwrap_or_default()
                    .to_string()
            })
            .collect();

        let mut race = RawRace {
            name,
            key,
            id: race_id.to_string(),
            bonuses,
            upgrades: vars::TOWER_UPGRADES
                .map(|slot| get(vars::UPGRADES, slot))
                .into(),
            magic: get(vars::UPGRADES, vars::MAGIC),
            base_upgrades: BaseUpgrades {
                melee: get(vars::UPGRADES, vars::MELEE),
                armor: get(vars::UPGRADES, vars::ARMOR),
                range: get(vars::UPGRADES, vars::RANGE),
                wall: get(vars::UPGRADES, vars::WALL),
            },
            auras,
            t1spell: skill_on("Z"),
            t2spell: skill_on("X"),
            heroes,
            buildings: RaceBuildings {
                fort: fort.id.clone(),
                tower: get(vars::TOWER, vars::BUILDING_SLOT),
                barrack: get(vars::BARRACK, vars::BUILDING_SLOT),
            },
            units: vars::UNITS.map(|array| get(array, vars::UNIT_SLOT)),
            bonus_upgrades: IndexMap::new(),
            bonus_heroes: Vec::new(),
            ulti_data: None,
        };

        self.enrich_bonuses(&mut race)?;
        race.ulti_data = self.ultimate_data(&race_vars)?;
        debug!("Mined race {} ({})", race.key, race.id);
        Ok(Some(race))
    }

    /// Bonus heroes and bonus upgrades granted by each bonus building
    fn enrich_bonuses(&self, race: &mut RawRace) -> Result<()> {
        let text = self.text();
        let hero_set = pattern(&format!(
            r#"(?mi)^set ({})\[1\].*?['|"](.*?)['|"].*?$"#,
            alternation(vars::HEROES)
        ))?;
        let upgrade_set = pattern(&format!(
            r#"(?mi)^set {}\[(?:{})\].*?['"](\w+)['"]$"#,
            vars::UPGRADES,
            alternation(vars::BONUS_UPGRADES)
        ))?;

        for bonus_id in race.bonuses.clone() {
            match bonus_id.as_str() {
                "n02Q" => race.bonus_heroes.push(BonusHero {
                    slot: BONUS_HERO_SLOT,
                    id: "U00N".to_string(),
                }),
                "n00W" => {
                    race.bonus_heroes.push(BonusHero {
                        slot: BONUS_HERO_SLOT,
                        id: "N00T".to_string(),
                    });
                    continue;
                }
                _ => {}
            }

            let built = pattern(&format!(
                r"(?mi)(\w+) takes nothing returns boolean$\n^return\(GetUnitTypeId\(GetTriggerUnit\(\)\)=='{}'\)$",
                regex::escape(&bonus_id)
            ))?;
            let Some(condition) = first_capture(&built, text) else {
                continue;
            };
            let call = pattern(&format!(r"(?mi)^if\({}\(\)\)", regex::escape(&condition)))?;
            let Some(found) = call.find(text) else {
                continue;
            };
            let block = block_at(text, found.start())?;

            if let Some(caps) = hero_set.captures(block) {
                if let Some(slot) = vars::HEROES.iter().position(|h| *h == &caps[1]) {
                    race.bonus_heroes.push(BonusHero {
                        slot,
                        id: caps[2].to_string(),
                    });
                }
                continue;
            }

            let upgrades = all_captures(&upgrade_set, block);
            if upgrades.is_empty() {
                continue;
            }
            let mut leveled = Vec::with_capacity(upgrades.len());
            for upgrade in upgrades {
                let swap = pattern(&format!(
                    r"(?mi)SetPlayerTechResearchedSwap\('{}',(\d+)",
                    regex::escape(&upgrade)
                ))?;
                let level = first_capture(&swap, text)
                    .and_then(|level| level.parse().ok())
                    .unwrap_or(0);
                leveled.push((upgrade, level));
            }
            race.bonus_upgrades.insert(bonus_id, leveled);
        }
        Ok(())
    }

    fn ultimate_data(&self, race_vars: &ArrayVars) -> Result<Option<RaceUltimateData>> {
        let Some(id) = lookup(race_vars, vars::REPLACEABLE, vars::ULTIMATE) else {
            return Ok(None);
        };
        let abilities = self.catalog.abilities();
        let mut data = RaceUltimateData {
            kind: ObjectKind::Ultimate,
            id: id.to_string(),
            name: abilities
                .get(id)
                .map(|view| abilities.display_name(&view, None))
                .unwrap_or_else(|| DEFAULT_ULTIMATE_NAME.to_string()),
            hotkey: Some(ULTIMATE_HOTKEY.to_string()),
            damage_time: None,
            steal_interrupt: None,
            fake_steal_interrupt: None,
        };

        self.mine_damage(&mut data)?;
        if let Some(description) = lookup(race_vars, vars::REPLACEABLE, vars::DESCRIPTION) {
            self.mine_decoy(&mut data, description)?;
        }
        Ok(Some(data))
    }

    /// Damage timing of the ultimate, and whether it interrupts channeling
    fn mine_damage(&self, data: &mut RaceUltimateData) -> Result<()> {
        let text = self.text();
        let cast = pattern(&format!(
            r"(?m)(\w+)\stakes nothing returns boolean\nreturn\(GetSpellAbilityId\(\)=='{}'\)",
            regex::escape(&data.id)
        ))?;
        let Some(cast_check) = first_capture(&cast, text) else {
            return Ok(());
        };
        let target = pattern(&format!(
            r"(?m)if\({}\(\).+\nset\s(\w{{2,4}}\[.+\])",
            regex::escape(&cast_check)
        ))?;
        let Some(target_var) = first_capture(&target, text) else {
            return Ok(());
        };
        let target_var = regex::escape(&target_var);

        let player = pattern(&format!(
            r"(?m)(\w+)\stakes nothing returns boolean\nreturn\({target_var}=="
        ))?;
        let damage_ability = match first_capture(&player, text) {
            Some(player_check) => {
                let grant = pattern(&format!(
                    r"(?m)if\({}\(\).+\n(?:^.+$\n){{1,10}}?call UnitAddAbilityBJ\('(\w+)",
                    regex::escape(&player_check)
                ))?;
                first_capture(&grant, text)
            }
            None => {
                let dummy = pattern(&format!(
                    r"(?m)CreateNUnitsAtLoc.+?{target_var}.+\n(?:^.+$\n){{0,3}}?call UnitAddAbilityBJ\('(\w+).+\n(?:^.+$\n){{0,3}}call IssueTargetOrderBJ.+thunderbolt"
                ))?;
                let found = first_capture(&dummy, text);
                if found.is_some() {
                    data.steal_interrupt = Some(true);
                }
                found
            }
        };

        let abilities = self.catalog.abilities();
        let Some(ability) = damage_ability.and_then(|id| abilities.get(&id)) else {
            return Ok(());
        };
        if data.steal_interrupt.is_none() {
            let order = ability.raw_text("ord", None).unwrap_or_default();
            data.steal_interrupt = Some(INTERRUPT_ORDERS.contains(&order.as_str()));
        }
        let damage_time = ability
            .value("dur", None)
            .or_else(|| ability.value("bz1", None));
        if let Some(time) = damage_time.filter(Value::is_truthy) {
            data.damage_time = Some(time);
        }
        Ok(())
    }

    /// Whether the race's decoy ultimate also interrupts channeling
    fn mine_decoy(&self, data: &mut RaceUltimateData, description: &str) -> Result<()> {
        let text = self.text();
        let swap = pattern(&format!(
            r"(?m)call UnitAddAbilityBJ\('{}.+\n(?:^.+$\n){{0,2}}?call UnitRemoveAbilityBJ\('{}.+\ncall UnitAddAbilityBJ\('(\w+)",
            MANA_BURN,
            regex::escape(description)
        ))?;
        let Some(decoy) = first_capture(&swap, text) else {
            return Ok(());
        };

        let cast = pattern(&format!(
            r"(?m)(\w+)\stakes nothing returns boolean\nreturn\(GetSpellAbilityId\(\)=='{}",
            regex::escape(&decoy)
        ))?;
        if let Some(cast_check) = first_capture(&cast, text) {
            let scripted = pattern(&format!(
                r"(?m)if\({}.+\n(?:^.+$\n){{1,10}}call IssueTargetOrderBJ.+thunderbolt",
                regex::escape(&cast_check)
            ))?;
            if scripted.is_match(text) {
                data.fake_steal_interrupt = Some(true);
            }
        }

        let abilities = self.catalog.abilities();
        if let Some(ability) = abilities.get(&decoy) {
            if data.fake_steal_interrupt.is_none() {
                let order = ability.raw_text("ord", None).unwrap_or_default();
                data.fake_steal_interrupt = Some(INTERRUPT_ORDERS.contains(&order.as_str()));
            }
        }
        Ok(())
    }

    fn ultimates(&self) -> Result<RawUltimates> {
        let text = self.text();
        let abilities = self.catalog.abilities();
        let pickers = abilities
            .get(ULTIMATE_PICKER)
            .and_then(|view| view.array("pb1", None))
            .unwrap_or_default();

        let mut spells = IndexMap::new();
        for picker in &pickers {
            let cast = pattern(&format!(
                r"(?m)function (\w+) takes nothing returns boolean\nreturn\(GetSpellAbilityId\(\)=='{}'\)\n",
                regex::escape(picker)
            ))?;
            let Some(cast_check) = first_capture(&cast, text) else {
                continue;
            };
            let call = pattern(&format!(r"(?mi)if\({}\(\)\)then", regex::escape(&cast_check)))?;
            let Some(found) = call.find(text) else {
                continue;
            };
            let granted = all_captures(&ULTIMATE_GRANT, block_at(text, found.start())?);
            if !granted.is_empty() {
                spells.insert(picker.clone(), granted);
            }
        }

        Ok(RawUltimates { pickers, spells })
    }

    /// Recipes from the item combining triggers
    fn artifacts(&self) -> RawArtifacts {
        let mut combine_map = CombineMap::new();
        for recipe in ARTIFACT_RECIPE.find_iter(self.text()) {
            let recipe = recipe.as_str();
            let parts = all_captures(&ARTIFACT_PART, recipe);
            if let Some(result) = first_capture(&ARTIFACT_RESULT, recipe) {
                if !parts.is_empty() {
                    combine_map.insert(result, vec![parts]);
                }
            }
        }

        RawArtifacts {
            list: combine_list(&combine_map),
            combine_map,
        }
    }

    fn neutrals(&self) -> Result<Vec<String>> {
        let text = self.text();
        let colored = all_captures(&NEUTRAL_COLOR, text);
        if colored.is_empty() {
            warn!("No neutral spawns found");
            return Ok(Vec::new());
        }
        let spawn = pattern(&format!(
            r"(?m)set (?:{})=CreateUnit\(p,'(\w+)",
            alternation(&colored)
        ))?;
        Ok(all_captures(&spawn, text)
            .into_iter()
            .filter(|id| !IGNORED_NEUTRALS.contains(&id.as_str()))
            .collect())
    }

    /// Item unlock levels per hero, from the hero level triggers
    fn prepare_hero_items(&self) -> Result<IndexMap<String, HeroItems>> {
        let text = self.text();
        let mut heroes: IndexMap<String, HeroItems> = FIXED_HERO_ITEMS
            .iter()
            .map(|(hero, items)| {
                let items = items.iter().map(|(id, level)| (id.to_string(), *level)).collect();
                (hero.to_string(), items)
            })
            .collect();

        for block in HERO_ITEM_BLOCK.find_iter(text) {
            let block = block.as_str();
            let Some(condition) = first_capture(&CONDITION_CALL, block) else {
                continue;
            };
            let hero_check = pattern(&format!(
                r"(?m)function {}\s.+\nreturn\s?\(GetUnitTypeId\(GetTriggerUnit\(\)\)=='(\w+)",
                regex::escape(&condition)
            ))?;
            let Some(hero_id) = first_capture(&hero_check, text) else {
                continue;
            };

            let mut items = HeroItems::new();
            for caps in HERO_ITEM_GRANT.captures_iter(block) {
                let level_check = pattern(&format!(
                    r"function {}\s.+\n.+?>=(\d+|\$\w+)",
                    regex::escape(&caps[1])
                ))?;
                let level = first_capture(&level_check, text)
                    .and_then(|literal| parse_jass_int(&literal))
                    .and_then(|level| u32::try_from(level).ok());
                if let Some(level) = level {
                    items.insert(caps[2].to_string(), level);
                }
            }
            heroes.insert(hero_id, items);
        }
        Ok(heroes)
    }
}

impl ScriptMiner for OgMiner<'_> {
    fn variant(&self) -> MapVariant {
        MapVariant::Og
    }

    fn patch_data(&self) -> Result<RawPatchData> {
        let pickers = self.race_ids()?;
        let mut races = Vec::new();
        for id in pickers.values().flatten() {
            match self.race(id)? {
                Some(race) => races.push(race),
                None => warn!("Race {} has no setup trigger, skipped", id),
            }
        }
        info!("Mined {} races from {} alliances", races.len(), pickers.len());

        Ok(RawPatchData {
            pickers,
            races,
            ultimates: self.ultimates()?,
            artifacts: self.artifacts(),
            misc: RawMisc {
                neutrals: self.neutrals()?,
                shrines: None,
            },
        })
    }

    fn bonus_unit(&self, bonus_id: &str) -> Result<Option<String>> {
        let text = self.text();
        let trigger = pattern(&format!(
            r"(?mi)function (\w+).+\n.+GetTriggerUnit.+{}.{{1,10}}\nendfunction",
            regex::escape(bonus_id)
        ))?;
        let Some(condition) = first_capture(&trigger, text) else {
            return Ok(None);
        };
        let call = pattern(&format!(r"(?mi)if\({}\(\)\)", regex::escape(&condition)))?;
        let Some(found) = call.find(text) else {
            return Ok(None);
        };
        let block = block_at(text, found.start())?;

        let unit_set = pattern(&format!(
            r#"(?mi)set (?:{})\[\d\]\s?=\s?['"](\w+)"#,
            alternation(vars::UNITS.slots().map(|(_, array)| *array))
        ))?;
        Ok(first_capture(&unit_set, block))
    }

    fn enrich_unit_requires(&self, mut unit: UnitObject) -> Result<UnitObject> {
        let text = self.text();
        let entering = pattern(&format!(
            r#"(?mi)function (\w+).+$\n.*?GetUnitTypeId\(GetEnteringUnit\(\)\)==['"]{}"#,
            regex::escape(&unit.id)
        ))?;
        let mut conditions = Vec::new();
        for condition in all_captures(&entering, text) {
            push_unique(&mut conditions, condition);
        }

        for condition in conditions {
            let call = pattern(&format!(r"\b{}\(\)", regex::escape(&condition)))?;
            for line in text.lines().filter(|line| call.is_match(line)) {
                unit.upgrades.extend(all_captures(&TECH_COUNT, line));
            }
        }
        dedup_in_order(&mut unit.upgrades);
        Ok(unit)
    }

    fn hero_items(&self, hero_id: &str) -> Result<Option<HeroItems>> {
        Ok(self.hero_items.get(hero_id).cloned())
    }
}

/// Array assignments of a race block; the first write of a slot wins
fn array_vars(block: &str) -> ArrayVars {
    let mut vars = ArrayVars::new();
    for caps in ARRAY_SET.captures_iter(block) {
        vars.entry(caps[1].to_string())
            .or_default()
            .entry(caps[2].to_string())
            .or_insert_with(|| caps[3].to_string());
    }
    vars
}

fn lookup<'v>(vars: &'v ArrayVars, array: &str, slot: &str) -> Option<&'v str> {
    vars.get(array)?.get(slot).map(String::as_str)
}

/// Lowest numeric slot, else the first slot written
fn first_slot(slots: &IndexMap<String, String>) -> Option<&str> {
    slots
        .iter()
        .filter_map(|(slot, value)| slot.parse::<u32>().ok().map(|n| (n, value)))
        .min_by_key(|(n, _)| *n)
        .map(|(_, value)| value.as_str())
        .or_else(|| slots.values().next().map(String::as_str))
}

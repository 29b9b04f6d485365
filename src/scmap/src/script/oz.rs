//! Miner for the OZ edition
//!
//! The OZ script is optimized: variables have one or two letter names and
//! every id is a packed integer (`1346978609` for `PIC1`). Race pickers are
//! abilities whose `pb1` lists the races.

use super::{
    all_captures, alternation, block_at, combine_list, first_capture, pattern, HeroItems,
    ScriptMiner,
};
use crate::catalog::Catalog;
use crate::categories::CategoryRules;
use crate::objects::{BaseUpgrades, CombineMap, UnitObject};
use crate::raw::{BonusHero, RawArtifacts, RawMisc, RawPatchData, RawRace, RawUltimates};
use crate::variant::MapVariant;
use crate::{Error, Result};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use w3data::{decode_fourcc, decode_literal, encode_fourcc, ScriptText};

/// Race picker abilities, `PIC1` to `PIC5`
const PICKERS: [u64; 5] = [1346978609, 1346978610, 1346978611, 1346978612, 1346978613];

/// Fort research hotkeys that override the base upgrade variables
const FORT_UPGRADE_HOTKEYS: BaseUpgrades<&str> = BaseUpgrades {
    melee: "A",
    armor: "D",
    range: "S",
    wall: "F",
};

/// Bonus buildings whose unit is granted outside the script
const SCRIPTLESS_BONUS_UNITS: [(&str, &str); 1] = [("n066", "O05N")];

/// Item recipes; the OZ script combines items through a generic trigger
const COMBINE_MAP: [(&str, &[&[&str]]); 29] = [
    ("I034", &[&["I00E", "I00F", "I00G"]]),
    ("I70F", &[&["I00E", "I00F", "I00G", "I034"]]),
    ("I03H", &[&["I00H", "I00J"]]),
    ("I03E", &[&["I00H", "I00I"]]),
    ("I03J", &[&["I00H", "I00K"]]),
    ("I03G", &[&["I00J", "I00I"]]),
    ("I03F", &[&["I00J", "I00K"]]),
    ("I03I", &[&["I00K", "I00I"]]),
    ("I03V", &[&["I03E", "I03H"]]),
    ("I03R", &[&["I03H", "I03J"]]),
    ("I03S", &[&["I03H", "I03I"]]),
    ("I03Q", &[&["I03E", "I03J"]]),
    ("I03T", &[&["I03E", "I03I"]]),
    ("I03U", &[&["I03G", "I03F"]]),
    ("I03O", &[&["I03G", "I03I"]]),
    ("I03M", &[&["I03G", "I03H"]]),
    ("I03Y", &[&["I03H", "I03F"]]),
    ("I03K", &[&["I03G", "I03E"]]),
    ("I03W", &[&["I03E", "I03F"]]),
    ("I03L", &[&["I03G", "I03J"]]),
    ("I03N", &[&["I03F", "I03I"]]),
    ("I03P", &[&["I03F", "I03J"]]),
    ("I70B", &[&["I034"], &["I03N"], &["I03U"]]),
    ("I70A", &[&["I034"], &["I03W"], &["I03Q"]]),
    ("I70C", &[&["I034"], &["I03T"], &["I03L"]]),
    ("I70E", &[&["I034"], &["I03Y"], &["I03R"]]),
    ("I70D", &[&["I034"], &["I03S"], &["I03K"]]),
    ("I03Z", &[&["I034"], &["I03P"], &["I03O"]]),
    ("I03X", &[&["I034"], &["I03M"], &["I03V"]]),
];

/// Variables the race init block sets
mod vars {
    use crate::objects::{BaseUpgrades, RaceBuildings, RaceUnits};

    pub const AURA: &str = "r";
    pub const HEROES: [&str; 4] = ["t", "i", "S", "c"];
    pub const BONUS_PICKER: &str = "I";
    pub const DESCRIPTION: &str = "k";
    pub const MAGIC: &str = "N";

    pub const BUILDINGS: RaceBuildings<&str> = RaceBuildings {
        fort: "m",
        barrack: "Q",
        tower: "U",
    };

    pub const BASE_UPGRADES: BaseUpgrades<&str> = BaseUpgrades {
        melee: "V",
        armor: "M",
        range: "B",
        wall: "ww",
    };

    pub const UNITS: RaceUnits<&str> = RaceUnits {
        melee: "P",
        range: "A",
        mage: "D",
        siege: "H",
        air: "J",
        catapult: "K",
    };
}

static SCALAR_SET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)set (\w+)(?:\[.+\])?\s?=\s?(.*)$").unwrap());
static NAME_SET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)set (.{2,6})\s?=\s?['"](.+)['"]$"#).unwrap());
static NAME_APPLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^call SetPlayerName\(.{2,6},(.+)\)").unwrap());
static PLAYER_NAME_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)call SetPlayerName\(.+?,\s?['"](\w+)"#).unwrap());
static UNSAFE_KEY_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\-]").unwrap());
static NAME_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^.*?-\s+").unwrap());
static NAME_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.+\]").unwrap());
static TECH_RESEARCHED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)call SetPlayerTechResearched\(.{3,6},(\d+),(\d+)").unwrap());
static ULTIMATE_REGISTRATIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?mi)(?:(?:call .{3,6}\(.{2,6},\d+,\d+,.+Ulti.+\n(?:set.+\n)?)+)|(?:(?:call .{3,6}\(.{3,6},\d+,\d+\)\n){10,11})",
    )
    .unwrap()
});
static ULTIMATE_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)call .*?(\d{5,}),\s?(\d{5,})").unwrap());
static ULTIMATE_SET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^set .{3,7}?=(\d+)").unwrap());
static SHRINE_REGISTRATIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?mi)(?:(?:call .{2,6}\(.+?,(?:\d{6,},)+.*Shrine.*\)$\n){3,})|(?:(?:call .{2,6}\(.{2,6}(?:,\d{9,11}){4,}\)\n){4,})",
    )
    .unwrap()
});
static SHRINE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{6,}").unwrap());
static NEUTRAL_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4,}").unwrap());
static ITEM_UNLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?mi)if .{2,40}\s?>=(\d{1,2})\s.+\n(?:^.+$\n){0,20}?call UnitAddItemById\(.{2,6},\s?(\d+)",
    )
    .unwrap()
});
static LEVEL_CHECK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r".+GetHeroLevel\(.{2,6}\)>?=(\d{1,2})").unwrap());
static ABILITY_GRANT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"UnitAddAbility\(.{2,6}?,(\d+)").unwrap());

/// Lines required after the neutral array declaration
const NEUTRAL_MIN_SETS: usize = 9;
/// Lines allowed between the declaration and the first set
const NEUTRAL_MAX_GAP: usize = 6;

pub struct OzMiner<'a> {
    script: &'a ScriptText,
    catalog: &'a Catalog,
}

impl<'a> OzMiner<'a> {
    pub fn new(script: &'a ScriptText, catalog: &'a Catalog) -> Self {
        Self { script, catalog }
    }

    fn text(&self) -> &'a str {
        self.script.as_str()
    }

    /// Picker id to the race ids it offers
    ///
    /// Pickers offering nothing are skipped; a map without any is an error.
    fn pickers(&self) -> Result<IndexMap<String, Vec<String>>> {
        let abilities = self.catalog.abilities();
        let mut pickers = IndexMap::new();
        for packed in PICKERS {
            let id = decode_fourcc(packed);
            match abilities.get(&id).and_then(|view| view.array("pb1", None)) {
                Some(races) => {
                    pickers.insert(id, races);
                }
                None => warn!("Race picker {} offers no races", id),
            }
        }
        if pickers.is_empty() {
            return Err(Error::missing("ability", decode_fourcc(PICKERS[0]), "race pickers"));
        }
        Ok(pickers)
    }

    fn race(&self, id: &str) -> Result<RawRace> {
        let text = self.text();
        let packed = encode_fourcc(id)?;
        let init = pattern(&format!(
            r"(?m)\b(?:else)?if .{{1,6}}==.{{1,3}}.+\n(?:^.+$\n){{0,3}}call .{{1,6}}\(.{{1,6}},\s?{packed}\)\n(?:^.+$\n){{1,20}}call.+UnitRemoveAbility.+{packed}"
        ))?;
        let found = init
            .find(text)
            .ok_or_else(|| Error::missing("race", id, "init block"))?;
        let block = block_at(text, found.start())?;

        let race_vars = scalar_vars(block);
        let get = |var: &str| race_vars.get(var).cloned().unwrap_or_default();

        let units = self.catalog.units();
        let abilities = self.catalog.abilities();
        let upgrades = self.catalog.upgrades();

        let key = race_key(block).ok_or_else(|| Error::missing("race", id, "key"))?;
        let name = abilities
            .get(id)
            .map(|view| abilities.display_name(&view, None))
            .unwrap_or_default();
        let name = NAME_TAG
            .replace(&NAME_PREFIX.replace(&name, ""), "")
            .trim()
            .to_string();

        let auras = abilities
            .get(&get(vars::AURA))
            .and_then(|view| view.array("pb1", None))
            .ok_or_else(|| Error::missing("race", id, "aura"))?;

        let buildings = vars::BUILDINGS.map(get);
        let fort = units.get(&buildings.fort);

        let own = [get(vars::AURA), get(vars::DESCRIPTION)];
        let mut spells = fort
            .as_ref()
            .and_then(|view| view.array("abi", None))
            .unwrap_or_default()
            .into_iter()
            .filter(|ability| !own.contains(ability) && abilities.get(ability).is_some());
        let t1spell = spells.next().unwrap_or_default();
        let t2spell = spells.next().unwrap_or_default();

        let fort_researches: Vec<_> = fort
            .as_ref()
            .and_then(|view| view.array("res", None))
            .unwrap_or_default()
            .iter()
            .filter_map(|id| upgrades.get(id))
            .collect();
        let base_upgrades = vars::BASE_UPGRADES
            .map(get)
            .zip_with(FORT_UPGRADE_HOTKEYS, |var_id, hotkey| {
                fort_researches
                    .iter()
                    .find(|view| view.raw_text("hk1", None).as_deref() == Some(hotkey))
                    .map(|view| view.id().to_string())
                    .unwrap_or(var_id)
            });

        let bonuses = units
            .get(&get(vars::BONUS_PICKER))
            .and_then(|view| view.array("upt", None))
            .ok_or_else(|| Error::missing("race", id, "bonus picker"))?;

        let mut race = RawRace {
            name,
            key,
            id: id.to_string(),
            bonuses,
            upgrades: units
                .get(&buildings.tower)
                .and_then(|view| view.array("res", None))
                .unwrap_or_default(),
            magic: get(vars::MAGIC),
            base_upgrades,
            auras,
            t1spell,
            t2spell,
            heroes: vars::HEROES.map(get).into(),
            units: vars::UNITS.map(get),
            buildings,
            bonus_upgrades: IndexMap::new(),
            bonus_heroes: Vec::new(),
            ulti_data: None,
        };

        self.enrich_bonuses(&mut race)?;
        debug!("Mined race {} ({})", race.key, race.id);
        Ok(race)
    }

    /// Conditional block run when `bonus_id` is built
    ///
    /// Single-statement blocks are skipped; those only announce the build.
    fn bonus_block(&self, bonus_id: &str) -> Result<Option<&'a str>> {
        let text = self.text();
        let packed = encode_fourcc(bonus_id)?;
        let check = pattern(&format!(r"(?mi)\b(?:else)?if .{{3,6}}\s?=={packed}\b"))?;

        for found in check.find_iter(text) {
            let mut rest = text[found.end()..].lines().skip(1);
            let body_ends = matches!(
                (rest.next(), rest.next()),
                (Some(line), Some(end)) if !line.is_empty() && end.starts_with("endif")
            );
            if !body_ends {
                return Ok(Some(block_at(text, found.start())?));
            }
        }
        Ok(None)
    }

    /// Hero swaps and starting research levels granted by each bonus
    fn enrich_bonuses(&self, race: &mut RawRace) -> Result<()> {
        let hero_swap = pattern(&format!(
            r"set ({})\[.{{2,5}}\]\s?=\s?(\d{{5,}})",
            alternation(vars::HEROES)
        ))?;
        let units = self.catalog.units();

        for bonus_id in race.bonuses.clone() {
            let Some(block) = self.bonus_block(&bonus_id)? else {
                debug!("No script block for bonus {}", bonus_id);
                continue;
            };

            for caps in hero_swap.captures_iter(block) {
                let Some(slot) = vars::HEROES.iter().position(|var| *var == &caps[1]) else {
                    continue;
                };
                let id = decode_literal(&caps[2]);
                if !race.bonus_heroes.iter().any(|hero| hero.id == id) {
                    race.bonus_heroes.push(BonusHero { slot, id });
                }
            }

            let researched: Vec<(String, String)> = TECH_RESEARCHED
                .captures_iter(block)
                .map(|caps| (caps[1].to_string(), caps[2].to_string()))
                .collect();
            let researches: Vec<(String, u32)> = units
                .get(&bonus_id)
                .and_then(|view| view.array("res", None))
                .unwrap_or_default()
                .into_iter()
                .map(|upgrade| {
                    let packed = encode_fourcc(&upgrade).map(|n| n.to_string()).ok();
                    let level = researched
                        .iter()
                        .find(|(research, _)| Some(research) == packed.as_ref())
                        .and_then(|(_, level)| level.parse().ok())
                        .unwrap_or(0);
                    (upgrade, level)
                })
                .collect();
            if !researches.is_empty() {
                race.bonus_upgrades.insert(bonus_id, researches);
            }
        }
        Ok(())
    }

    /// Each picker's registered spell, replaced by what its block grants
    fn ultimates(&self) -> Result<RawUltimates> {
        let text = self.text();
        let registrations = ULTIMATE_REGISTRATIONS
            .find(text)
            .ok_or_else(|| Error::missing("script", "war3map.j", "ultimate registrations"))?;

        let mut spells = IndexMap::new();
        for caps in ULTIMATE_PAIR.captures_iter(registrations.as_str()) {
            let (picker, spell) = (&caps[1], &caps[2]);
            let granted = self.ultimate_spells(picker)?;
            let ids: Vec<&str> = match granted.as_slice() {
                [only] => vec![spell, only.as_str()],
                [first, second] => vec![first.as_str(), second.as_str()],
                _ => vec![spell],
            };
            spells.insert(
                decode_literal(picker),
                ids.into_iter().map(decode_literal).collect(),
            );
        }

        Ok(RawUltimates {
            pickers: spells.keys().cloned().collect(),
            spells,
        })
    }

    /// Distinct packed ids the picker's block assigns, in order
    fn ultimate_spells(&self, picker: &str) -> Result<Vec<String>> {
        let text = self.text();
        let check = pattern(&format!(r"if .{{3,7}}\s?=\s?{picker}\b"))?;
        let Some(found) = check.find(text) else {
            return Ok(Vec::new());
        };
        let Ok(block) = block_at(text, found.start()) else {
            debug!("Ultimate picker {} check is not a block", picker);
            return Ok(Vec::new());
        };

        let mut granted = Vec::new();
        for id in all_captures(&ULTIMATE_SET, block) {
            if !granted.contains(&id) {
                granted.push(id);
            }
        }
        Ok(granted)
    }

    fn shrines(&self) -> Option<Vec<String>> {
        let Some(block) = SHRINE_REGISTRATIONS.find(self.text()) else {
            warn!("No shrine registrations found");
            return None;
        };
        let mut shrines = Vec::new();
        for id in SHRINE_ID.find_iter(block.as_str()) {
            let id = decode_literal(id.as_str());
            if !shrines.contains(&id) {
                shrines.push(id);
            }
        }
        Some(shrines)
    }

    fn artifacts(&self) -> RawArtifacts {
        let combine_map: CombineMap = COMBINE_MAP
            .iter()
            .map(|(result, recipes)| {
                let recipes = recipes
                    .iter()
                    .map(|parts| parts.iter().map(|id| id.to_string()).collect())
                    .collect();
                (result.to_string(), recipes)
            })
            .collect();

        RawArtifacts {
            list: combine_list(&combine_map),
            combine_map,
        }
    }

    fn neutrals(&self) -> Vec<String> {
        match neutral_block(self.text()) {
            Some(block) => NEUTRAL_ID
                .find_iter(&block)
                .map(|id| decode_literal(id.as_str()))
                .collect(),
            None => {
                warn!("No neutral spawn table found");
                Vec::new()
            }
        }
    }

    /// Items a hero picks through its leveling abilities
    fn choosable_items(&self, packed_hero: u32) -> Result<Option<HeroItems>> {
        let text = self.text();
        let check = pattern(&format!(
            r"if GetUnitTypeId\((.{{2,6}})\)=={packed_hero}.+\n(.+)"
        ))?;
        let found = check.captures_iter(text).find(|caps| {
            caps[2]
                .get(1..)
                .is_some_and(|line| line.contains(&format!("GetHeroLevel({})", &caps[1])))
        });
        let Some(found) = found.and_then(|caps| caps.get(0)) else {
            return Ok(None);
        };
        let block = block_at(text, found.start())?;

        let mut items = HeroItems::new();
        for caps in LEVEL_CHECK.captures_iter(block) {
            let Some(level) = caps[1].parse::<u32>().ok() else {
                continue;
            };
            let Some(start) = caps.get(0).map(|m| m.start()) else {
                continue;
            };
            let Ok(level_block) = block_at(block, start) else {
                continue;
            };

            for ability in all_captures(&ABILITY_GRANT, level_block) {
                let grant = pattern(&format!(
                    r"(?m).{{2,6}}=={ability}.+\n(?:^.+$\n){{1,12}}?.+UnitAddItemById\(.{{2,6}}?,(\d+)"
                ))?;
                if let Some(item) = first_capture(&grant, text) {
                    items.insert(decode_literal(&item), level);
                }
            }
        }
        Ok((!items.is_empty()).then_some(items))
    }
}

impl ScriptMiner for OzMiner<'_> {
    fn variant(&self) -> MapVariant {
        MapVariant::Oz
    }

    fn patch_data(&self) -> Result<RawPatchData> {
        let pickers = self.pickers()?;
        let races = pickers
            .values()
            .flatten()
            .map(|id| self.race(id))
            .collect::<Result<Vec<_>>>()?;
        info!("Mined {} races from {} pickers", races.len(), pickers.len());

        Ok(RawPatchData {
            pickers,
            races,
            ultimates: self.ultimates()?,
            artifacts: self.artifacts(),
            misc: RawMisc {
                neutrals: self.neutrals(),
                shrines: self.shrines(),
            },
        })
    }

    fn bonus_unit(&self, bonus_id: &str) -> Result<Option<String>> {
        if let Some((_, unit)) = SCRIPTLESS_BONUS_UNITS.iter().find(|(id, _)| *id == bonus_id) {
            return Ok(Some(unit.to_string()));
        }

        let text = self.text();
        let packed = encode_fourcc(bonus_id)?;
        let check = pattern(&format!(r"(?mi)\b(?:else)?if .{{2,6}}=={packed}\b"))?;
        let Some(found) = check.find(text) else {
            return Ok(None);
        };
        let block = block_at(text, found.start())?;

        let unit_swap = pattern(&format!(
            r"(?mi)set (?:{})(?:\[\w+\])?\s?=\s?(\d+)",
            alternation(vars::UNITS.slots().map(|(_, var)| *var))
        ))?;
        Ok(first_capture(&unit_swap, block).map(|id| decode_literal(&id)))
    }

    fn enrich_unit_requires(&self, unit: UnitObject) -> Result<UnitObject> {
        Ok(unit)
    }

    /// Choosable items first, then the fixed unlocks in level order
    fn hero_items(&self, hero_id: &str) -> Result<Option<HeroItems>> {
        let text = self.text();
        let packed = encode_fourcc(hero_id)?;
        let mut items = self.choosable_items(packed)?.unwrap_or_default();

        let check = pattern(&format!(
            r"(?mi)\b(?:else)?if .*?.{{2,6}}=={packed} (?:or .{{2,6}}==\d+ )*then\n(?:^.+$\n){{1,20}}?call UnitAddItem"
        ))?;
        let Some(found) = check.find(text) else {
            return Ok(Some(items));
        };
        let block = block_at(text, found.start())?;

        let mut previous = 0;
        for caps in ITEM_UNLOCK.captures_iter(block) {
            let Ok(level) = caps[1].parse::<u32>() else {
                break;
            };
            // Later grants below the running level belong to another hero
            if level < previous {
                break;
            }
            previous = level;
            items.insert(decode_literal(&caps[2]), level);
        }
        Ok(Some(items))
    }
}

/// `set var=value` assignments decoded as packed ids; last write wins
fn scalar_vars(block: &str) -> HashMap<String, String> {
    SCALAR_SET
        .captures_iter(block)
        .map(|caps| (caps[1].to_string(), decode_literal(&caps[2])))
        .collect()
}

/// Race key from the player name the init block sets
///
/// Either a string variable passed to `SetPlayerName` on the next line, or a
/// literal passed directly. Lower-cased, with unsafe characters replaced.
fn race_key(block: &str) -> Option<String> {
    let lines: Vec<&str> = block.lines().collect();
    let raw = lines.iter().enumerate().find_map(|(i, line)| {
        if let Some(caps) = NAME_SET.captures(line) {
            let applied = lines
                .get(i + 1)
                .and_then(|next| NAME_APPLY.captures(next))
                .is_some_and(|apply| apply[1].trim() == caps[1].trim());
            if applied {
                return Some(caps[2].to_string());
            }
        }
        first_capture(&PLAYER_NAME_LITERAL, line)
    })?;

    Some(
        UNSAFE_KEY_CHARS
            .replace_all(&raw.to_lowercase(), "_")
            .into_owned(),
    )
}

/// Lines of the neutral spawn table
///
/// A `local integer array` declaration followed, within a few lines, by a run
/// of at least nine assignments to that array.
fn neutral_block(text: &str) -> Option<String> {
    const DECLARATION: &str = "local integer array ";
    let lines: Vec<&str> = text.split('\n').collect();

    for (i, line) in lines.iter().enumerate() {
        let Some(at) = line.find(DECLARATION) else {
            continue;
        };
        let name = &line[at + DECLARATION.len()..];
        if name.is_empty() {
            continue;
        }
        let set_prefix = format!("set {name}");

        // Widest gap first
        for gap in (0..=NEUTRAL_MAX_GAP).rev() {
            let start = i + 1 + gap;
            let Some(between) = lines.get(i + 1..start) else {
                continue;
            };
            if between.iter().any(|l| l.is_empty()) {
                continue;
            }
            // Every matched line needs its newline
            let rest = lines.get(start..lines.len().saturating_sub(1)).unwrap_or_default();
            let sets = rest
                .iter()
                .take_while(|line| line.len() > set_prefix.len() && line.starts_with(&set_prefix))
                .count();
            if sets >= NEUTRAL_MIN_SETS {
                return Some(lines[i + 1..start + sets].join("\n"));
            }
        }
    }
    None
}

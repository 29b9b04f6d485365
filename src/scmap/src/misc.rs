//! Damage multipliers and bounty tables

use crate::catalog::Catalog;
use crate::categories::CategoryRules;
use crate::objects::{Bounty, RaceData, UnitObject};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};
use w3data::Value;

/// Percent damage dealt to light, medium, heavy, fortified, normal, hero,
/// divine and unarmored targets
pub type DamageRow = [i64; 8];

/// Percent damage per attack type and armor type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageTable {
    pub chaos: DamageRow,
    pub hero: DamageRow,
    pub magic: DamageRow,
    pub normal: DamageRow,
    pub pierce: DamageRow,
    pub siege: DamageRow,
    pub spells: DamageRow,
}

impl Default for DamageTable {
    fn default() -> Self {
        let full = [100; 8];
        Self {
            chaos: full,
            hero: full,
            magic: full,
            normal: full,
            pierce: full,
            siege: full,
            spells: full,
        }
    }
}

/// One multiplier as a percentage; blank, zero and garbage read as 100%
fn percent(raw: Option<&str>) -> i64 {
    let Some(raw) = raw else {
        return 100;
    };
    let trimmed = raw.trim();
    let value = if trimmed.is_empty() {
        0.0
    } else {
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => return 100,
        }
    };
    let value = if value == 0.0 { 1.0 } else { value };
    (value * 100.0).round() as i64
}

fn row(entries: &HashMap<&str, &str>, attack: &str) -> DamageRow {
    let key = format!("DamageBonus{attack}");
    let raw: Vec<&str> = entries
        .get(key.as_str())
        .map(|line| line.split(',').collect())
        .unwrap_or_else(|| vec![""]);

    let mut row = [100; 8];
    for (i, slot) in row.iter_mut().enumerate() {
        *slot = percent(raw.get(i).copied());
    }
    row
}

/// Parse the `DamageBonus<Type>=m1,...,m8` lines of `war3mapMisc.txt`
pub fn parse_damage_table(text: &str) -> DamageTable {
    let mut entries: HashMap<&str, &str> = HashMap::new();
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        let mut parts = line.split('=');
        if let (Some(key), Some(value)) = (parts.next(), parts.next()) {
            entries.insert(key, value);
        }
    }

    DamageTable {
        chaos: row(&entries, "Chaos"),
        hero: row(&entries, "Hero"),
        magic: row(&entries, "Magic"),
        normal: row(&entries, "Normal"),
        pierce: row(&entries, "Pierce"),
        siege: row(&entries, "Siege"),
        spells: row(&entries, "Spells"),
    }
}

/// Read the damage table; a missing file leaves every multiplier at 100%
pub fn load_damage_table(path: &Path) -> Result<DamageTable> {
    if !path.exists() {
        warn!("Misc table {} not found, using flat damage", path.display());
        return Ok(DamageTable::default());
    }
    let text = std::fs::read_to_string(path)?;
    Ok(parse_damage_table(&text))
}

/// Barrack ids from the lowest tier to the highest
///
/// Lower tiers are found by who upgrades into the current one, higher tiers
/// by following `upt` forward.
pub fn barrack_chain(catalog: &Catalog, barrack: &str) -> Vec<String> {
    let units = catalog.units();
    let table = catalog.table(w3data::Category::Units);
    let mut chain = vec![barrack.to_string()];

    let mut current = barrack.to_string();
    while let Some(lower) = table.ids_by_value("upt", current.as_str()).into_iter().next() {
        if chain.contains(&lower) {
            break;
        }
        chain.insert(0, lower.clone());
        current = lower;
    }

    let mut current = barrack.to_string();
    while let Some(next) = units
        .get(&current)
        .and_then(|view| view.array("upt", None))
        .and_then(|ids| ids.into_iter().next())
    {
        if chain.contains(&next) {
            break;
        }
        chain.push(next.clone());
        current = next;
    }

    chain
}

/// Bounty of every unit type one race fields
pub fn race_bounty(catalog: &Catalog, race: &RaceData) -> Bounty {
    let units = catalog.units();
    let points = |id: &str| {
        units
            .get(id)
            .and_then(|view| units.points(&view))
            .unwrap_or_else(|| Value::from("0"))
    };

    let barracks = barrack_chain(catalog, &race.buildings.barrack.id)
        .iter()
        .map(|id| points(id))
        .collect();

    let upgrade_spells = race
        .magic
        .iter()
        .chain(&race.tower_upgrades)
        .flat_map(|upgrade| &upgrade.spells);
    let mut summoned: Vec<&UnitObject> = Vec::new();
    for spell in [&race.t1spell, &race.t2spell].into_iter().chain(upgrade_spells) {
        for unit in &spell.summon_unit {
            if !summoned.iter().any(|u| u.id == unit.id) {
                summoned.push(unit);
            }
        }
    }
    debug!("{} summoned unit types for {}", summoned.len(), race.id);

    Bounty {
        melee: race.units.melee.bounty.clone(),
        range: race.units.range.bounty.clone(),
        mage: race.units.mage.bounty.clone(),
        siege: race.units.siege.bounty.clone(),
        air: race.units.air.bounty.clone(),
        catapult: race.units.catapult.bounty.clone(),
        hero: race.heroes.first().and_then(|h| h.unit.bounty.clone()),
        su: race.heroes.get(3).and_then(|h| h.unit.bounty.clone()),
        tower: race.buildings.tower.bounty.clone(),
        fort: race.buildings.fort.bounty.clone(),
        barracks,
        summon: summoned.into_iter().map(|u| u.bounty.clone()).collect(),
    }
}

//! Units and heroes

use super::{format_number, number_or_zero, CategoryRules};
use crate::catalog::Catalog;
use crate::objects::{HeroObject, ObjectKind, UnitObject};
use crate::Result;
use w3data::{with_fallback, Category, EntityView, ProfileTable, SideTable, Value};

/// Profile keys holding model paths, in preference order
const MODEL_KEYS: [&str; 3] = ["file", "file:sd", "file:hd"];

/// Chains of summons can lead back to the summoner
pub(crate) const MAX_SUMMON_DEPTH: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct Units<'c> {
    catalog: &'c Catalog,
}

impl<'c> CategoryRules<'c> for Units<'c> {
    fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    fn category(&self) -> Category {
        Category::Units
    }

    fn icon_key(&self) -> &'static str {
        "ico"
    }

    fn skins(&self) -> &'c ProfileTable {
        &self.catalog.baseline().unit_skins
    }

    /// Abilities the unit carries (`hab` for heroes, `abi` otherwise)
    fn cross_references(&self, view: &EntityView<'_>) -> Vec<String> {
        view.array("hab", None)
            .or_else(|| view.array("abi", None))
            .unwrap_or_default()
    }

    /// `nam`, else the stock unit name, else the tooltip
    fn display_name(&self, view: &EntityView<'_>, _level: Option<u32>) -> String {
        if let Some(name) = view.text("nam", None).filter(|n| !n.is_empty()) {
            return name;
        }
        self.string_value(view, "name")
            .or_else(|| view.text("tip", None))
            .unwrap_or_default()
    }
}

impl<'c> Units<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    fn balance(&self) -> &'c SideTable {
        &self.catalog.baseline().unit_balance
    }

    fn weapons(&self) -> &'c SideTable {
        &self.catalog.baseline().unit_weapons
    }

    fn unit_data(&self) -> &'c SideTable {
        &self.catalog.baseline().unit_data
    }

    /// Stock unit string for the entity or the one it derives from
    fn string_value(&self, view: &EntityView<'_>, key: &str) -> Option<String> {
        let strings = &self.catalog.baseline().unit_strings;
        let by_id = strings.value(view.id(), key).filter(|v| !v.is_empty());
        by_id
            .or_else(|| strings.value(view.backlink_id()?, key).filter(|v| !v.is_empty()))
            .map(String::from)
    }

    /// Hero proper name: `pro`, else the first stock proper name
    pub fn full_name(&self, view: &EntityView<'_>) -> String {
        if let Some(name) = view.text("pro", None).filter(|n| !n.is_empty()) {
            return name;
        }
        let strings = &self.catalog.baseline().unit_strings;
        let names = strings
            .value(view.id(), "propernames")
            .or_else(|| strings.value(view.backlink_id()?, "propernames"))
            .unwrap_or_default();
        names.split(',').next().unwrap_or_default().trim().to_string()
    }

    /// Damage range: `base + dice` to `base + dice * sides`
    pub fn attack(&self, view: &EntityView<'_>) -> String {
        let id = view.id();
        let base = number_or_zero(with_fallback(view, "a1b", self.weapons(), "dmgplus1").as_ref(), "dmgplus1", id);
        let dice = number_or_zero(with_fallback(view, "a1d", self.weapons(), "dice1").as_ref(), "dice1", id);
        let sides = number_or_zero(with_fallback(view, "a1s", self.weapons(), "sides1").as_ref(), "sides1", id);
        let sides = if sides == 0.0 { 1.0 } else { sides };

        format!(
            "{}-{}",
            format_number(base + dice),
            format_number(base + dice * sides)
        )
    }

    /// Model path: `mdl`, else the stock skin's model file
    pub fn model(&self, view: &EntityView<'_>) -> Option<String> {
        if let Some(model) = view.text("mdl", None).filter(|m| !m.is_empty()) {
            return Some(model);
        }
        let skins = self.skins();
        let section = skins
            .get(view.id())
            .or_else(|| skins.get(view.backlink_id()?))?;
        MODEL_KEYS
            .iter()
            .find_map(|k| section.get(*k))
            .cloned()
    }

    /// Gold bounty (`poi`)
    pub fn points(&self, view: &EntityView<'_>) -> Option<Value> {
        with_fallback(view, "poi", self.unit_data(), "points")
    }

    fn tags(&self, view: &EntityView<'_>) -> Vec<String> {
        let mut tags: Vec<String> = with_fallback(view, "typ", self.balance(), "type")
            .map(|v| v.to_string().replace('_', ""))
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let movement = with_fallback(view, "mvt", self.unit_data(), "movetp");
        if movement.as_ref().and_then(Value::as_str) == Some("fly") {
            tags.push("air".to_string());
        }
        tags
    }

    /// Unit object without its patch applied
    pub(crate) fn build_unit(&self, view: &EntityView<'_>, depth: usize) -> Result<UnitObject> {
        let balance = self.balance();
        let weapons = self.weapons();
        let abilities = self.catalog.abilities();

        let skills = match view.array("hab", None).or_else(|| view.array("abi", None)) {
            Some(ids) => {
                let mut skills = Vec::new();
                for id in ids {
                    if let Some(ability) = abilities.get(&id) {
                        skills.push(abilities.spell_at(&ability, None, depth + 1)?);
                    }
                }
                Some(skills)
            }
            None => None,
        };

        Ok(UnitObject {
            kind: ObjectKind::Unit,
            id: view.id().to_string(),
            name: self.display_name(view, None),
            hotkey: view.text("hot", None),
            description: view.text("tub", None),
            cost: view.value("gol", None),
            hp: with_fallback(view, "hpm", balance, "HP"),
            hp_reg: with_fallback(view, "hpr", balance, "regenHP"),
            mp: with_fallback(view, "mpm", balance, "realM"),
            mp_reg: with_fallback(view, "mpr", balance, "regenMana"),
            def: with_fallback(view, "def", balance, "def"),
            def_type: with_fallback(view, "dty", balance, "defType"),
            atk: self.attack(view),
            atk_type: with_fallback(view, "a1t", weapons, "atkType1"),
            atk_range: with_fallback(view, "a1r", weapons, "rangeN1"),
            atk_speed: with_fallback(view, "a1c", weapons, "cool1"),
            weapon_type: with_fallback(view, "a1w", weapons, "weapTp1"),
            upgrades: view.array("pgr", None).unwrap_or_default(),
            tags: self.tags(view),
            skills,
            bounty: self.points(view),
        })
    }

    pub fn unit_object(&self, view: &EntityView<'_>) -> Result<UnitObject> {
        let unit = self.build_unit(view, 0)?;
        self.catalog.patch(view.id(), unit)
    }

    /// Hero object without its patch applied
    ///
    /// Unlike plain units, skills without a name or numbers are left out.
    pub(crate) fn build_hero(&self, view: &EntityView<'_>) -> Result<HeroObject> {
        let balance = self.balance();
        let mut unit = self.build_unit(view, 0)?;
        unit.kind = ObjectKind::Hero;
        let skills = unit.skills.take().unwrap_or_default();
        unit.skills = Some(skills.into_iter().filter(|s| s.is_meaningful()).collect());

        let stat = with_fallback(view, "pra", balance, "Primary")
            .map(|v| v.to_string().to_lowercase())
            .unwrap_or_default();

        Ok(HeroObject {
            unit,
            full_name: self.full_name(view),
            stat,
            str: with_fallback(view, "str", balance, "STR"),
            agi: with_fallback(view, "agi", balance, "AGI"),
            int: with_fallback(view, "int", balance, "INT"),
            str_lvl: with_fallback(view, "stp", balance, "STRplus"),
            agi_lvl: with_fallback(view, "agp", balance, "AGIplus"),
            int_lvl: with_fallback(view, "inp", balance, "INTplus"),
            items: None,
        })
    }

    pub fn hero_object(&self, view: &EntityView<'_>) -> Result<HeroObject> {
        let hero = self.build_hero(view)?;
        self.catalog.patch(view.id(), hero)
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::{Baseline, Catalog};
    use crate::categories::CategoryRules;
    use crate::objects::ObjectKind;
    use std::collections::HashMap;
    use std::sync::Arc;
    use w3data::{
        Category, EntityRawTable, ObjectTable, PatchTable, ProfileTable, TextFormatter, Value,
    };

    fn table(category: Category, json: &str) -> EntityRawTable {
        let table = ObjectTable::from_json_str(json).unwrap();
        EntityRawTable::new(category, table.into_entities(), Arc::new(TextFormatter::default()))
    }

    fn empty(category: Category) -> EntityRawTable {
        table(category, r#"{ "original": {}, "custom": {} }"#)
    }

    fn test_catalog(patches: PatchTable) -> Catalog {
        let units = table(
            Category::Units,
            r#"{
                "original": {
                    "hfoo": [ { "id": "uhot", "type": "string", "level": 0, "column": 0, "value": "F" } ]
                },
                "custom": {
                    "h000:hfoo": [
                        { "id": "unam", "type": "string", "level": 0, "column": 0, "value": "Knight" },
                        { "id": "ua1b", "type": "int", "level": 0, "column": 0, "value": 10 },
                        { "id": "ua1d", "type": "int", "level": 0, "column": 0, "value": 2 },
                        { "id": "ua1s", "type": "int", "level": 0, "column": 0, "value": 6 },
                        { "id": "uabi", "type": "string", "level": 0, "column": 0, "value": "A000,Anone" },
                        { "id": "umvt", "type": "string", "level": 0, "column": 0, "value": "fly" }
                    ],
                    "H000:Hpal": [
                        { "id": "uhab", "type": "string", "level": 0, "column": 0, "value": "A000,A001" },
                        { "id": "upra", "type": "string", "level": 0, "column": 0, "value": "STR" }
                    ]
                }
            }"#,
        );
        let abilities = table(
            Category::Abilities,
            r#"{
                "original": {},
                "custom": {
                    "A000:AHbz": [
                        { "id": "atp1", "type": "string", "level": 1, "column": 0, "value": "Storm" },
                        { "id": "acdn", "type": "string", "level": 1, "column": 0, "value": "6,8" }
                    ],
                    "A001:AHbz": [
                        { "id": "atp1", "type": "string", "level": 1, "column": 0, "value": "Passive" }
                    ]
                }
            }"#,
        );

        let mut baseline = Baseline::default();
        baseline.unit_balance.insert_row(
            "hfoo",
            HashMap::from([
                ("HP".to_string(), Value::Int(420)),
                ("type".to_string(), Value::from("_Mechanical,Ground")),
            ]),
        );
        baseline.unit_strings = ProfileTable::parse(
            "[Hpal]\nName=Paladin\nPropernames=Uther,Arthas\n",
            None,
        );
        baseline.unit_skins = ProfileTable::parse("[hfoo]\nfile=units\\footman\\footman\n", None);

        Catalog::new(
            units,
            empty(Category::Items),
            abilities,
            empty(Category::Upgrades),
            baseline,
            patches,
        )
    }

    #[test]
    fn test_unit_object() {
        let catalog = test_catalog(PatchTable::new());
        let units = catalog.units();
        let view = units.get("h000").unwrap();
        let unit = units.unit_object(&view).unwrap();

        assert_eq!(unit.kind, ObjectKind::Unit);
        assert_eq!(unit.name, "Knight");
        assert_eq!(unit.atk, "12-22");
        assert_eq!(unit.hp, Some(Value::Int(420)));
        assert_eq!(unit.tags, vec!["mechanical", "ground", "air"]);
        let skills = unit.skills.unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].cooldown, Some(vec![6.0, 8.0]));
    }

    #[test]
    fn test_attack_without_sides() {
        let catalog = test_catalog(PatchTable::new());
        let units = catalog.units();
        let view = units.get("hfoo").unwrap();
        assert_eq!(units.attack(&view), "0-0");
    }

    #[test]
    fn test_model_falls_back_to_base_skin() {
        let catalog = test_catalog(PatchTable::new());
        let units = catalog.units();
        let view = units.get("h000").unwrap();
        assert_eq!(units.model(&view).as_deref(), Some("units\\footman\\footman"));
        assert!(units.model(&units.get("H000").unwrap()).is_none());
    }

    #[test]
    fn test_hero_object() {
        let catalog = test_catalog(PatchTable::new());
        let units = catalog.units();
        let view = units.get("H000").unwrap();
        let hero = units.hero_object(&view).unwrap();

        assert_eq!(hero.unit.kind, ObjectKind::Hero);
        assert_eq!(hero.unit.name, "Paladin");
        assert_eq!(hero.full_name, "Uther");
        assert_eq!(hero.stat, "str");
        let skills = hero.unit.skills.unwrap();
        assert_eq!(skills.len(), 1, "skill without numbers is dropped");
        assert_eq!(skills[0].id, "A000");
    }

    #[test]
    fn test_hero_patch_applied_once() {
        let patches = PatchTable::from_json_str(r#"{ "H000": { "tags": ["boss"] } }"#).unwrap();
        let catalog = test_catalog(patches);
        let units = catalog.units();
        let hero = units.hero_object(&units.get("H000").unwrap()).unwrap();
        assert_eq!(hero.unit.tags, vec!["boss"]);
    }
}

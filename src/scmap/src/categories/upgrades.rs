//! Upgrades (researches)

use super::{number_or_zero, CategoryRules};
use crate::catalog::{Catalog, IconMap};
use crate::objects::{ObjectKind, SpellObject, UpgradeObject};
use crate::Result;
use w3data::{with_fallback, Category, EntityView, ProfileTable, SideTable};

#[derive(Debug, Clone, Copy)]
pub struct Upgrades<'c> {
    catalog: &'c Catalog,
}

impl<'c> CategoryRules<'c> for Upgrades<'c> {
    fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    fn category(&self) -> Category {
        Category::Upgrades
    }

    fn icon_key(&self) -> &'static str {
        "ar1"
    }

    fn skins(&self) -> &'c ProfileTable {
        &self.catalog.baseline().upgrade_skins
    }

    /// Abilities that require this upgrade
    fn cross_references(&self, view: &EntityView<'_>) -> Vec<String> {
        self.catalog
            .table(Category::Abilities)
            .ids_by_value("req", view.id())
    }

    /// Upgrades with one icon per grade register each as `<id>-<grade>`
    fn register_icon(&self, view: &EntityView<'_>, icons: &mut IconMap) -> Result<()> {
        let grades = self.icons(view)?;
        if grades.len() > 1 {
            for (i, icon) in grades.into_iter().enumerate() {
                icons.insert(format!("{}-{}", view.id(), i + 1), icon);
            }
            return Ok(());
        }

        let icon = self.icon(view, None)?;
        if !icon.is_empty() {
            icons.insert(view.id().to_string(), icon);
        }
        Ok(())
    }
}

impl<'c> Upgrades<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    fn data(&self) -> &'c SideTable {
        &self.catalog.baseline().upgrade_data
    }

    fn number(&self, view: &EntityView<'_>, key: &str, column: &str) -> f64 {
        let value = with_fallback(view, key, self.data(), column);
        number_or_zero(value.as_ref(), column, view.id())
    }

    /// Gold cost of every grade
    pub fn costs(&self, view: &EntityView<'_>) -> Vec<f64> {
        let base = self.number(view, "glb", "goldbase");
        let step = self.number(view, "glm", "goldmod");
        (0..view.max_level())
            .map(|grade| base + f64::from(grade) * step)
            .collect()
    }

    /// Research time of every grade
    pub fn timers(&self, view: &EntityView<'_>) -> Vec<f64> {
        let base = self.number(view, "tib", "timebase");
        let step = self.number(view, "tim", "timemod");
        (0..view.max_level())
            .map(|grade| base + f64::from(grade) * step)
            .collect()
    }

    /// Spells unlocked by this upgrade; their summon icons go to `icons`
    pub fn spells(&self, view: &EntityView<'_>, mut icons: Option<&mut IconMap>) -> Result<Vec<SpellObject>> {
        let abilities = self.catalog.abilities();
        let mut spells = Vec::new();
        for id in self.cross_references(view) {
            let Some(ability) = abilities.get(&id) else {
                continue;
            };
            if let Some(icons) = icons.as_deref_mut() {
                abilities.register_icon_silent(&ability, icons);
            }
            spells.push(abilities.spell_object(&ability, icons.as_deref_mut())?);
        }
        Ok(spells)
    }

    pub fn upgrade_object(&self, view: &EntityView<'_>, mut icons: Option<&mut IconMap>) -> Result<UpgradeObject> {
        let icons_count = self
            .icons(view)
            .map(|grades| grades.len())
            .unwrap_or_default();

        let spells = self
            .spells(view, icons.as_deref_mut())?
            .into_iter()
            .filter(SpellObject::is_meaningful)
            .collect();

        let upgrade = UpgradeObject {
            kind: ObjectKind::Upgrade,
            id: view.id().to_string(),
            name: self.display_name(view, None),
            hotkey: view.text("hk1", None),
            description: view.text("ub1", None),
            icons_count: (icons_count > 1).then_some(icons_count),
            cost: self.costs(view),
            timers: Some(self.timers(view)),
            spells,
            level: None,
        };
        self.catalog.patch(view.id(), upgrade)
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::{Baseline, Catalog, IconMap};
    use crate::categories::CategoryRules;
    use std::collections::HashMap;
    use std::sync::Arc;
    use w3data::{Category, EntityRawTable, ObjectTable, PatchTable, TextFormatter, Value};

    fn table(category: Category, json: &str) -> EntityRawTable {
        let table = ObjectTable::from_json_str(json).unwrap();
        EntityRawTable::new(category, table.into_entities(), Arc::new(TextFormatter::default()))
    }

    fn test_catalog(patches: PatchTable) -> Catalog {
        let upgrades = table(
            Category::Upgrades,
            r#"{
                "original": {},
                "custom": {
                    "R000:Rhme": [
                        { "id": "gnam", "type": "string", "level": 1, "column": 0, "value": "Iron Swords" },
                        { "id": "gnam", "type": "string", "level": 2, "column": 0, "value": "Steel Swords" },
                        { "id": "gar1", "type": "string", "level": 1, "column": 0, "value": "iron.blp" },
                        { "id": "gar1", "type": "string", "level": 2, "column": 0, "value": "steel.blp" },
                        { "id": "gar1", "type": "string", "level": 3, "column": 0, "value": "steel.blp" },
                        { "id": "ghk1", "type": "string", "level": 0, "column": 0, "value": "A" },
                        { "id": "gglb", "type": "int", "level": 0, "column": 0, "value": 100 },
                        { "id": "gglm", "type": "int", "level": 0, "column": 0, "value": 50 }
                    ],
                    "R001:Rhar": [
                        { "id": "gnam", "type": "string", "level": 1, "column": 0, "value": "Armor" },
                        { "id": "gar1", "type": "string", "level": 1, "column": 0, "value": "armor.blp" },
                        { "id": "glvl", "type": "int", "level": 0, "column": 0, "value": 2 }
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
                        { "id": "atp1", "type": "string", "level": 1, "column": 0, "value": "Cleave" },
                        { "id": "areq", "type": "string", "level": 0, "column": 0, "value": "R000" },
                        { "id": "acdn", "type": "string", "level": 0, "column": 0, "value": "5" }
                    ],
                    "A001:AHbz": [
                        { "id": "atp1", "type": "string", "level": 1, "column": 0, "value": "Passive" },
                        { "id": "areq", "type": "string", "level": 0, "column": 0, "value": "R000" }
                    ]
                }
            }"#,
        );

        let mut baseline = Baseline::default();
        baseline.upgrade_data.insert_row(
            "Rhar",
            HashMap::from([
                ("goldbase".to_string(), Value::Int(75)),
                ("goldmod".to_string(), Value::Int(25)),
                ("timebase".to_string(), Value::Int(60)),
                ("timemod".to_string(), Value::Int(15)),
            ]),
        );

        Catalog::new(
            table(Category::Units, r#"{ "original": {}, "custom": {} }"#),
            table(Category::Items, r#"{ "original": {}, "custom": {} }"#),
            abilities,
            upgrades,
            baseline,
            patches,
        )
    }

    #[test]
    fn test_costs_and_timers() {
        let catalog = test_catalog(PatchTable::new());
        let upgrades = catalog.upgrades();

        let swords = upgrades.get("R000").unwrap();
        assert_eq!(upgrades.costs(&swords), vec![100.0, 150.0, 200.0]);
        assert_eq!(upgrades.timers(&swords), vec![0.0, 0.0, 0.0]);

        let armor = upgrades.get("R001").unwrap();
        assert_eq!(upgrades.costs(&armor), vec![75.0, 100.0]);
        assert_eq!(upgrades.timers(&armor), vec![60.0, 75.0]);
    }

    #[test]
    fn test_upgrade_object() {
        let catalog = test_catalog(PatchTable::new());
        let upgrades = catalog.upgrades();
        let view = upgrades.get("R000").unwrap();
        let upgrade = upgrades.upgrade_object(&view, None).unwrap();

        assert_eq!(upgrade.name, "Iron Swords");
        assert_eq!(upgrade.hotkey.as_deref(), Some("A"));
        assert_eq!(upgrade.icons_count, Some(2));
        assert_eq!(upgrade.spells.len(), 1);
        assert_eq!(upgrade.spells[0].name, "Cleave");
        assert_eq!(upgrades.cross_references(&view), vec!["A000", "A001"]);
    }

    #[test]
    fn test_register_icon_per_grade() {
        let catalog = test_catalog(PatchTable::new());
        let upgrades = catalog.upgrades();
        let mut icons = IconMap::new();

        upgrades.register_icon(&upgrades.get("R000").unwrap(), &mut icons).unwrap();
        assert_eq!(icons.get("R000-1").map(String::as_str), Some("iron.blp"));
        assert_eq!(icons.get("R000-2").map(String::as_str), Some("steel.blp"));
        assert!(!icons.contains_key("R000-3"));

        upgrades.register_icon(&upgrades.get("R001").unwrap(), &mut icons).unwrap();
        assert_eq!(icons.get("R001").map(String::as_str), Some("armor.blp"));
    }

    #[test]
    fn test_patch_overrides_icons_count() {
        let patches = PatchTable::from_json_str(r#"{ "R001": { "iconsCount": 3 } }"#).unwrap();
        let catalog = test_catalog(patches);
        let upgrades = catalog.upgrades();
        let upgrade = upgrades
            .upgrade_object(&upgrades.get("R001").unwrap(), None)
            .unwrap();
        assert_eq!(upgrade.icons_count, Some(3));
    }
}

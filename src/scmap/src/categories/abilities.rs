//! Abilities as spell objects

use super::units::MAX_SUMMON_DEPTH;
use super::{numbers, CategoryRules};
use crate::catalog::{Catalog, IconMap};
use crate::objects::{ObjectKind, SpellObject, UnitObject};
use crate::Result;
use w3data::{Category, EntityView, ProfileTable};

/// Fields listing unit ids an ability creates
const SUMMON_KEYS: [&str; 5] = ["sf1", "we1", "dp1", "aiu", "ai3"];

#[derive(Debug, Clone, Copy)]
pub struct Abilities<'c> {
    catalog: &'c Catalog,
}

impl<'c> CategoryRules<'c> for Abilities<'c> {
    fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    fn category(&self) -> Category {
        Category::Abilities
    }

    fn icon_key(&self) -> &'static str {
        "art"
    }

    fn skins(&self) -> &'c ProfileTable {
        &self.catalog.baseline().ability_skins
    }

    fn cross_references(&self, view: &EntityView<'_>) -> Vec<String> {
        self.summons(view)
    }

    /// Tooltip title; ability names carry no level suffix
    fn display_name(&self, view: &EntityView<'_>, _level: Option<u32>) -> String {
        view.raw_text("tp1", None).unwrap_or_default()
    }
}

impl<'c> Abilities<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    /// Unit ids summoned at any level, first-seen order
    pub fn summons(&self, view: &EntityView<'_>) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for key in SUMMON_KEYS {
            for value in view.all_values(key) {
                for id in value.to_string().split(',').map(str::trim) {
                    if !id.is_empty() && !ids.iter().any(|seen| seen == id) {
                        ids.push(id.to_string());
                    }
                }
            }
        }
        ids
    }

    /// Spell object with its summoned units; their icons go to `icons`
    pub fn spell_object(&self, view: &EntityView<'_>, icons: Option<&mut IconMap>) -> Result<SpellObject> {
        self.spell_at(view, icons, 0)
    }

    pub(crate) fn spell_at(
        &self,
        view: &EntityView<'_>,
        mut icons: Option<&mut IconMap>,
        depth: usize,
    ) -> Result<SpellObject> {
        let id = view.id();
        let units = self.catalog.units();

        let mut summon_unit: Vec<UnitObject> = Vec::new();
        if depth < MAX_SUMMON_DEPTH {
            for unit_id in self.summons(view) {
                let Some(unit) = units.get(&unit_id) else {
                    continue;
                };
                if summon_unit.iter().any(|u| u.id == unit_id) {
                    continue;
                }
                if let Some(icons) = icons.as_deref_mut() {
                    units.register_icon_silent(&unit, icons);
                }
                let object = units.build_unit(&unit, depth + 1)?;
                summon_unit.push(self.catalog.patch(&unit_id, object)?);
            }
        }

        let spell = SpellObject {
            kind: ObjectKind::Spell,
            id: id.to_string(),
            name: self.display_name(view, None),
            hotkey: view.text("hky", None),
            description: view.text("ub1", None),
            area: numbers(view.array("are", None), "area", id),
            cooldown: numbers(view.array("cdn", None), "cooldown", id),
            cost: numbers(view.array("mcs", None), "mana cost", id),
            duration: numbers(view.array("dut", None), "duration", id),
            targets: view.array("tar", None),
            summon_unit,
            icons_count: None,
        };
        self.catalog.patch(id, spell)
    }
}

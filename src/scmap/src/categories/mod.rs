//! Category extractors
//!
//! One extractor per object table. They share a small capability set
//! ([`CategoryRules`]): how an entity is named, where its icon comes from and
//! which other entities it points at. Object builders live on the concrete
//! types.

mod abilities;
mod items;
mod units;
mod upgrades;

pub use abilities::Abilities;
pub use items::Items;
pub use units::Units;
pub use upgrades::Upgrades;

use crate::catalog::{Catalog, IconMap};
use crate::{Error, Result};
use tracing::{debug, warn};
use w3data::{Category, EntityView, ProfileTable, Value};

/// Profile keys holding icon paths, in preference order
pub(crate) const ART_KEYS: [&str; 3] = ["art", "art:sd", "art:hd"];

/// Capabilities shared by every category extractor
pub trait CategoryRules<'c> {
    fn catalog(&self) -> &'c Catalog;

    fn category(&self) -> Category;

    /// Object table field holding the icon path
    fn icon_key(&self) -> &'static str;

    /// Baseline profile sections for entities the map did not override
    fn skins(&self) -> &'c ProfileTable;

    /// Ids of entities in other categories this one links to
    fn cross_references(&self, view: &EntityView<'_>) -> Vec<String>;

    fn get(&self, id: &str) -> Option<EntityView<'c>> {
        self.catalog().table(self.category()).get(id)
    }

    /// `nam` at `level`, else `typ`
    fn display_name(&self, view: &EntityView<'_>, level: Option<u32>) -> String {
        view.raw("nam", level)
            .filter(Value::is_truthy)
            .or_else(|| view.raw("typ", None))
            .map(|v| v.to_string())
            .unwrap_or_default()
    }

    /// Icon path for `level`
    ///
    /// The table field wins; otherwise the profile section of the entity (or
    /// the one it was derived from), whose art list is indexed by level.
    fn icon(&self, view: &EntityView<'_>, level: Option<u32>) -> Result<String> {
        let key = self.icon_key();
        let field = view.raw(key, level).or_else(|| view.raw(key, None));
        if let Some(icon) = field.filter(Value::is_truthy) {
            return Ok(icon.to_string());
        }

        let skins = self.skins();
        let section = skins
            .get(view.id())
            .or_else(|| skins.get(view.backlink_id()?))
            .ok_or_else(|| Error::missing(self.category(), view.id(), "icon"))?;

        let art = ART_KEYS
            .iter()
            .find_map(|k| section.get(*k))
            .map(String::as_str)
            .unwrap_or_default();
        let paths: Vec<&str> = art.split(',').collect();
        let index = level.unwrap_or(0) as usize;
        let path = paths.get(index).or_else(|| paths.first()).copied();
        Ok(path.unwrap_or_default().to_string())
    }

    /// Distinct icons over levels `1..=max_level`
    fn icons(&self, view: &EntityView<'_>) -> Result<Vec<String>> {
        let mut icons: Vec<String> = Vec::new();
        for level in 1..=view.max_level() {
            let icon = self.icon(view, Some(level))?;
            if !icons.contains(&icon) {
                icons.push(icon);
            }
        }
        Ok(icons)
    }

    /// Record the entity's icon under its id
    fn register_icon(&self, view: &EntityView<'_>, icons: &mut IconMap) -> Result<()> {
        let icon = self.icon(view, None)?;
        if !icon.is_empty() {
            icons.insert(view.id().to_string(), icon);
        }
        Ok(())
    }

    /// [`Self::register_icon`], ignoring entities without any icon source
    fn register_icon_silent(&self, view: &EntityView<'_>, icons: &mut IconMap) {
        if let Err(e) = self.register_icon(view, icons) {
            debug!("Skipping icon: {}", e);
        }
    }
}

/// Numeric reading of an optional table value
///
/// Absent or unparsable values read as zero with a warning.
pub(crate) fn number_or_zero(value: Option<&Value>, what: &str, id: &str) -> f64 {
    match parse_number(value) {
        NumberField::Parsed(n) => n,
        NumberField::Absent => {
            debug!("No {} at {}", what, id);
            0.0
        }
        NumberField::Malformed => {
            warn!("Non-numeric {} at {}", what, id);
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum NumberField {
    Absent,
    Malformed,
    Parsed(f64),
}

fn parse_number(value: Option<&Value>) -> NumberField {
    let Some(value) = value else {
        return NumberField::Absent;
    };
    match value.to_f64() {
        Some(n) if !n.is_nan() => NumberField::Parsed(n),
        _ => NumberField::Malformed,
    }
}

/// Render a number without a trailing `.0` for whole values
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Numbers out of a comma list, zero for malformed items
pub(crate) fn numbers(items: Option<Vec<String>>, what: &str, id: &str) -> Option<Vec<f64>> {
    items.map(|items| {
        items
            .iter()
            .map(|item| number_or_zero(Some(&Value::Text(item.clone())), what, id))
            .collect()
    })
}

//! Items as artifacts

use super::CategoryRules;
use crate::catalog::Catalog;
use crate::objects::{ArtifactObject, ObjectKind};
use crate::Result;
use w3data::{Category, EntityView, ProfileTable, Value};

/// Items whose level field does not match their shop tier
const LEVEL_OVERRIDES: [(&str, u32); 1] = [("I034", 2)];

#[derive(Debug, Clone, Copy)]
pub struct Items<'c> {
    catalog: &'c Catalog,
}

impl<'c> CategoryRules<'c> for Items<'c> {
    fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    fn category(&self) -> Category {
        Category::Items
    }

    fn icon_key(&self) -> &'static str {
        "ico"
    }

    fn skins(&self) -> &'c ProfileTable {
        &self.catalog.baseline().item_skins
    }

    /// Items grant abilities but artifacts never show them
    fn cross_references(&self, _view: &EntityView<'_>) -> Vec<String> {
        Vec::new()
    }
}

impl<'c> Items<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    /// Shop tier: `lvo`, else `lev`
    pub fn level(&self, view: &EntityView<'_>) -> Option<u32> {
        if let Some((_, level)) = LEVEL_OVERRIDES.iter().find(|(id, _)| *id == view.id()) {
            return Some(*level);
        }
        view.value("lvo", None)
            .or_else(|| view.value("lev", None))
            .as_ref()
            .and_then(Value::to_f64)
            .map(|n| n as u32)
    }

    /// Artifact without a level; the item's name doubles as its hotkey label
    pub fn artifact_object(&self, view: &EntityView<'_>, level: Option<u32>) -> Result<ArtifactObject> {
        let artifact = ArtifactObject {
            kind: ObjectKind::Artifact,
            id: view.id().to_string(),
            name: self.display_name(view, None),
            hotkey: view.raw_text("nam", None),
            description: view.text("tub", None),
            level,
        };
        self.catalog.patch(view.id(), artifact)
    }
}

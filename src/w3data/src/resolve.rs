//! Field resolution with a baseline table fallback
//!
//! Object tables only carry fields a map changed. Stock values live in the
//! game's SYLK tables, keyed by the entity id or, for derived entities, by the
//! id they were copied from.

use crate::entity::EntityView;
use crate::record::Value;
use crate::slk::SideTable;

/// `view.raw(key)`, else `side[id][column]`, else `side[backlink][column]`
pub fn with_fallback(
    view: &EntityView<'_>,
    key: &str,
    side: &SideTable,
    column: &str,
) -> Option<Value> {
    if let Some(value) = view.raw(key, None) {
        return Some(value);
    }

    side.get(view.id(), column)
        .or_else(|| side.get(view.backlink_id()?, column))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::TextFormatter;
    use crate::record::{Category, RawRecord};
    use crate::table::EntityRawTable;
    use indexmap::IndexMap;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn test_side() -> SideTable {
        let mut side = SideTable::default();
        side.insert_row(
            "hfoo",
            HashMap::from([("HP".to_string(), Value::Int(420))]),
        );
        side.insert_row(
            "hkni",
            HashMap::from([("HP".to_string(), Value::Int(800))]),
        );
        side
    }

    fn test_table() -> EntityRawTable {
        let mut entities = IndexMap::new();
        entities.insert("hfoo".to_string(), vec![]);
        entities.insert(
            "hkni".to_string(),
            vec![RawRecord::new("hpm", 0, 900i64)],
        );
        entities.insert(
            "h000".to_string(),
            vec![RawRecord::backlink("hfoo")],
        );
        entities.insert("h001".to_string(), vec![]);
        EntityRawTable::new(Category::Units, entities, Arc::new(TextFormatter::default()))
    }

    #[test]
    fn test_override_wins() {
        let table = test_table();
        let view = table.get("hkni").unwrap();
        assert_eq!(with_fallback(&view, "hpm", &test_side(), "HP"), Some(Value::Int(900)));
    }

    #[test]
    fn test_side_table_by_id() {
        let table = test_table();
        let view = table.get("hfoo").unwrap();
        assert_eq!(with_fallback(&view, "hpm", &test_side(), "HP"), Some(Value::Int(420)));
    }

    #[test]
    fn test_side_table_by_backlink() {
        let table = test_table();
        let view = table.get("h000").unwrap();
        assert_eq!(with_fallback(&view, "hpm", &test_side(), "HP"), Some(Value::Int(420)));
    }

    #[test]
    fn test_nothing_found() {
        let table = test_table();
        let view = table.get("h001").unwrap();
        assert_eq!(with_fallback(&view, "hpm", &test_side(), "HP"), None);
        let view = table.get("hfoo").unwrap();
        assert_eq!(with_fallback(&view, "hpm", &test_side(), "regenHP"), None);
    }
}

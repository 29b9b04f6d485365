//! Script miners
//!
//! Each map variant lays out its trigger code differently, so each gets its
//! own miner. Miners only hand back entity ids; the assembler resolves them.
//!
//! Patterns are built per lookup because most of them embed an id or a
//! function name found by an earlier lookup.

mod og;
mod oz;

pub use og::OgMiner;
pub use oz::OzMiner;

use crate::catalog::Catalog;
use crate::objects::{CombineMap, UnitObject};
use crate::raw::RawPatchData;
use crate::variant::MapVariant;
use crate::Result;
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashSet;
use w3data::{extract_conditional_block, ScriptText};

/// Item id to the hero level that unlocks it
pub type HeroItems = IndexMap<String, u32>;

/// Pulls race layouts and related ids out of one map script
pub trait ScriptMiner {
    fn variant(&self) -> MapVariant;

    /// Every race, ultimate, artifact and neutral the script wires up
    fn patch_data(&self) -> Result<RawPatchData>;

    /// Unit a bonus building adds to the race's roster
    fn bonus_unit(&self, bonus_id: &str) -> Result<Option<String>>;

    /// Append researches the script checks before the unit spawns
    fn enrich_unit_requires(&self, unit: UnitObject) -> Result<UnitObject>;

    /// Items a bonus hero receives while leveling
    fn hero_items(&self, hero_id: &str) -> Result<Option<HeroItems>>;
}

/// Miner for `variant`
pub fn miner_for<'a>(
    variant: MapVariant,
    script: &'a ScriptText,
    catalog: &'a Catalog,
) -> Result<Box<dyn ScriptMiner + 'a>> {
    Ok(match variant {
        MapVariant::Og => Box::new(OgMiner::new(script, catalog)?),
        MapVariant::Oz => Box::new(OzMiner::new(script, catalog)),
    })
}

fn pattern(source: &str) -> Result<Regex> {
    Ok(Regex::new(source)?)
}

/// `(?:a)|(?:b)|...` over escaped literals
fn alternation<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| format!("(?:{})", regex::escape(s.as_ref())))
        .collect::<Vec<_>>()
        .join("|")
}

/// First capture group of the first match
fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// First capture group of every match
fn all_captures(re: &Regex, text: &str) -> Vec<String> {
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Conditional block starting at `start`
///
/// A match on the `if` inside `elseif` is moved back to the `else`.
fn block_at(text: &str, start: usize) -> Result<&str> {
    let start = match text.get(..start) {
        Some(before) if before.ends_with("else") => start - "else".len(),
        _ => start,
    };
    Ok(extract_conditional_block(text, start)?)
}

fn push_unique(list: &mut Vec<String>, item: String) {
    if !list.contains(&item) {
        list.push(item);
    }
}

fn dedup_in_order(list: &mut Vec<String>) {
    let mut seen = HashSet::new();
    list.retain(|item| seen.insert(item.clone()));
}

/// Crafted items followed by their ingredients, first-seen order
fn combine_list(map: &CombineMap) -> Vec<String> {
    let mut list = Vec::new();
    for (result, recipes) in map {
        push_unique(&mut list, result.clone());
        for id in recipes.iter().flatten() {
            push_unique(&mut list, id.clone());
        }
    }
    list
}

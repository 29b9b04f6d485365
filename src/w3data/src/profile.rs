//! Profile tables: the game's INI-like skin and string files
//!
//! ```text
//! [hfoo]
//! Art=ReplaceableTextures\CommandButtons\BTNFootman.blp
//! Name=Footman
//! ```

use crate::Result;
use indexmap::IndexMap;
use std::path::Path;
use tracing::warn;

pub type Section = IndexMap<String, String>;

#[derive(Debug, Clone, Default)]
pub struct ProfileTable {
    sections: IndexMap<String, Section>,
}

impl ProfileTable {
    /// Parse profile text
    ///
    /// Keys are lower-cased. When `keys` is given only those keys are kept.
    /// Lines without `=` or with an empty value are ignored.
    pub fn parse(text: &str, keys: Option<&[&str]>) -> Self {
        let mut sections: IndexMap<String, Section> = IndexMap::new();
        let mut current: Option<String> = None;

        for line in text.lines() {
            let line = line.trim_end_matches('\r');

            if let Some(name) = line
                .trim()
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
            {
                sections.insert(name.to_string(), Section::new());
                current = Some(name.to_string());
                continue;
            }

            let Some(section) = current.as_ref().and_then(|id| sections.get_mut(id)) else {
                continue;
            };
            if line.starts_with("//") {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            if key.is_empty() || value.is_empty() {
                continue;
            }

            let key = key.to_lowercase();
            if keys.is_some_and(|allowed| !allowed.contains(&key.as_str())) {
                continue;
            }
            section.insert(key, value.to_string());
        }

        Self { sections }
    }

    /// Load a profile file; a missing file is an empty table
    pub fn load(path: &Path, keys: Option<&[&str]>) -> Result<Self> {
        if !path.exists() {
            warn!("Profile file {} not found", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text, keys))
    }

    /// Merge another table in; its sections replace whole sections here
    pub fn extend(&mut self, other: ProfileTable) {
        for (id, section) in other.sections {
            self.sections.insert(id, section);
        }
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Section> {
        self.sections.get(id)
    }

    pub fn value(&self, id: &str, key: &str) -> Option<&str> {
        self.sections.get(id)?.get(key).map(String::as_str)
    }
}

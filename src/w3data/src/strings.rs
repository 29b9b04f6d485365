//! Map string table (`war3map.wts`)
//!
//! ```text
//! STRING 12
//! // Units: h000 (Knight), Name (Name)
//! {
//! Knight
//! }
//! ```
//!
//! Object fields reference entries as `TRIGSTR_012`.

use crate::Result;
use std::collections::HashMap;
use std::path::Path;

const REFERENCE_PREFIX: &str = "TRIGSTR_";

#[derive(Debug, Clone, Default)]
pub struct StringTable {
    entries: HashMap<String, String>,
}

/// Strip leading zeros so `007` and `7` address the same entry
fn normalize_key(digits: &str) -> String {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

impl StringTable {
    pub fn parse(text: &str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut entries = HashMap::new();
        let mut current: Option<String> = None;
        let mut body: Option<Vec<&str>> = None;

        for line in text.lines() {
            let line = line.strip_suffix('\r').unwrap_or(line);

            if let Some(lines) = body.as_mut() {
                if line.trim() == "}" {
                    if let Some(key) = current.take() {
                        entries.insert(key, lines.join("\n"));
                    }
                    body = None;
                } else {
                    lines.push(line);
                }
                continue;
            }

            let trimmed = line.trim();
            if let Some(rest) = trimmed.strip_prefix("STRING") {
                let digits = rest.trim();
                if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                    current = Some(normalize_key(digits));
                }
            } else if trimmed == "{" && current.is_some() {
                body = Some(Vec::new());
            }
        }

        Self { entries }
    }

    /// Load from disk; an absent file is an empty table
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&normalize_key(key)).map(String::as_str)
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(normalize_key(key), value.into());
    }

    /// Resolve a `TRIGSTR_` reference
    ///
    /// Returns `None` when `text` is not a reference. A reference is resolved
    /// by the first run of digits starting with a non-zero digit; an
    /// unresolvable reference yields an empty string.
    pub fn resolve_reference(&self, text: &str) -> Option<String> {
        let rest = text.strip_prefix(REFERENCE_PREFIX)?;

        let resolved = rest
            .find(|c: char| ('1'..='9').contains(&c))
            .map(|start| {
                let digits = &rest[start..];
                let end = digits
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(digits.len());
                &digits[..end]
            })
            .and_then(|key| self.entries.get(key))
            .cloned()
            .unwrap_or_default();

        Some(resolved)
    }
}

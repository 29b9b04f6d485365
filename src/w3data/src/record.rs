//! Raw field records and their values

use serde::{Deserialize, Serialize};
use std::fmt;

/// Synthetic field pointing a custom or skinned entity back at its base id
pub const BACKLINK_KEY: &str = "wc3id";

/// Explicit level count field (`alev`/`glvl` once the prefix is stripped)
pub const LEVEL_COUNT_KEY: &str = "lvl";

/// Object table category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Units,
    Items,
    Abilities,
    Upgrades,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Units,
        Category::Items,
        Category::Abilities,
        Category::Upgrades,
    ];

    /// File extension of the table (`war3map.<ext>`)
    pub fn extension(self) -> &'static str {
        match self {
            Category::Units => "w3u",
            Category::Items => "w3t",
            Category::Abilities => "w3a",
            Category::Upgrades => "w3q",
        }
    }

    /// Parse from a category name or table extension
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "units" | "unit" | "w3u" => Some(Category::Units),
            "items" | "item" | "w3t" => Some(Category::Items),
            "abilities" | "ability" | "w3a" => Some(Category::Abilities),
            "upgrades" | "upgrade" | "w3q" => Some(Category::Upgrades),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Units => write!(f, "units"),
            Category::Items => write!(f, "items"),
            Category::Abilities => write!(f, "abilities"),
            Category::Upgrades => write!(f, "upgrades"),
        }
    }
}

/// A field value: object tables store strings, integers and reals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Real(_))
    }

    /// Numeric reading of the value
    ///
    /// Text is parsed after trimming; blank text reads as zero. Returns
    /// `None` for text that is not a number.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Real(n) => Some(*n),
            Value::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Some(0.0)
                } else {
                    trimmed.parse().ok()
                }
            }
        }
    }

    /// Whether the value counts as "set" (non-empty text, non-zero number)
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Real(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Real(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Real(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Real(n)
    }
}

/// One `(field, level, value)` record of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub key: String,
    pub level: u32,
    #[serde(default)]
    pub column: u32,
    pub value: Value,
}

impl RawRecord {
    pub fn new(key: impl Into<String>, level: u32, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            level,
            column: 0,
            value: value.into(),
        }
    }

    /// Backlink record pointing at `base_id`
    pub fn backlink(base_id: &str) -> Self {
        Self::new(BACKLINK_KEY, 0, base_id)
    }
}

//! SYLK spreadsheet reader for the game's baseline tables
//!
//! Only cell records matter:
//!
//! ```text
//! ID;PWXL;N;E
//! C;Y1;X1;K"unitBalanceID"
//! C;X2;K"HP"
//! C;Y2;X1;K"hfoo"
//! C;X2;K420
//! E
//! ```
//!
//! `X`/`Y` carry over from the previous record when omitted. The first row
//! names the columns; every other row is keyed by its id column.

use crate::record::Value;
use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

type Row = HashMap<String, Value>;

/// Id -> column -> value
#[derive(Debug, Clone, Default)]
pub struct SideTable {
    rows: HashMap<String, Row>,
}

/// Split a record into fields; `;;` is an escaped semicolon
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ';' {
            if chars.peek() == Some(&';') {
                chars.next();
                current.push(';');
            } else {
                fields.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    fields.push(current);
    fields
}

fn parse_cell_value(raw: &str) -> Value {
    if let Some(quoted) = raw.strip_prefix('"') {
        let text = quoted.strip_suffix('"').unwrap_or(quoted);
        return Value::Text(text.replace("\"\"", "\""));
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Int(n);
    }
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => Value::Real(n),
        _ => Value::Text(raw.to_string()),
    }
}

fn parse_coordinate(value: &str, line: usize) -> Result<u32> {
    value.parse().map_err(|_| Error::Sylk {
        line,
        reason: format!("bad coordinate {:?}", value),
    })
}

impl SideTable {
    /// Parse SYLK text, keying rows by the `id_column` header
    pub fn parse(text: &str, id_column: &str) -> Result<Self> {
        let mut grid: BTreeMap<u32, BTreeMap<u32, Value>> = BTreeMap::new();
        let mut x = 1u32;
        let mut y = 1u32;

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = line.trim_end_matches('\r');
            let fields = split_fields(line);
            let Some(kind) = fields.first() else {
                continue;
            };
            if kind != "C" && kind != "F" {
                continue;
            }

            let mut cell = None;
            for field in &fields[1..] {
                let mut chars = field.chars();
                match chars.next() {
                    Some('X') => x = parse_coordinate(chars.as_str(), line_no)?,
                    Some('Y') => y = parse_coordinate(chars.as_str(), line_no)?,
                    Some('K') => cell = Some(parse_cell_value(chars.as_str())),
                    _ => {}
                }
            }

            if kind == "C" {
                if let Some(value) = cell {
                    grid.entry(y).or_default().insert(x, value);
                }
            }
        }

        let mut rows_iter = grid.into_values();
        let Some(header_row) = rows_iter.next() else {
            return Ok(Self::default());
        };
        let header: BTreeMap<u32, String> = header_row
            .into_iter()
            .map(|(col, v)| (col, v.to_string()))
            .collect();

        let mut rows = HashMap::new();
        for cells in rows_iter {
            let row: Row = cells
                .into_iter()
                .filter_map(|(col, v)| header.get(&col).map(|name| (name.clone(), v)))
                .collect();
            let Some(id) = row.get(id_column).map(Value::to_string) else {
                continue;
            };
            rows.insert(id, row);
        }

        Ok(Self { rows })
    }

    pub fn load(path: &Path, id_column: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, id_column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, id: &str) -> Option<&HashMap<String, Value>> {
        self.rows.get(id)
    }

    pub fn get(&self, id: &str, column: &str) -> Option<&Value> {
        self.rows.get(id)?.get(column)
    }

    pub fn insert_row(&mut self, id: impl Into<String>, row: HashMap<String, Value>) {
        self.rows.insert(id.into(), row);
    }
}

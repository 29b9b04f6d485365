//! Script text buffer (`war3map.j`) and JASS literal helpers

use crate::block::extract_conditional_block;
use crate::Result;
use std::path::Path;

/// The decompiled map script with line endings normalized to `\n`
#[derive(Debug, Clone, Default)]
pub struct ScriptText {
    text: String,
}

/// A `function ... endfunction` span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionBody<'a> {
    pub name: &'a str,
    /// Byte offset of the `function` keyword
    pub start: usize,
    /// Text from `function` through `endfunction`
    pub text: &'a str,
}

impl ScriptText {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.replace("\r\n", "\n").replace('\r', "\n"),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::new(&text))
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// See [`extract_conditional_block`]
    pub fn conditional_block(&self, start: usize) -> Result<&str> {
        extract_conditional_block(&self.text, start)
    }

    /// Top-level function definitions, in script order
    ///
    /// A definition runs from its `function` line through the next line that
    /// is `endfunction`; an unclosed one runs to the end of the text.
    pub fn function_bodies(&self) -> Vec<FunctionBody<'_>> {
        let text = self.text.as_str();
        let mut bodies = Vec::new();
        let mut open: Option<(&str, usize)> = None;
        let mut offset = 0;

        for line in text.split_inclusive('\n') {
            let line_start = offset;
            offset += line.len();
            let trimmed = line.trim();

            if let Some((name, start)) = open {
                if trimmed == "endfunction" {
                    let end = line_start + line.find("endfunction").unwrap_or(0) + "endfunction".len();
                    bodies.push(FunctionBody {
                        name,
                        start,
                        text: &text[start..end],
                    });
                    open = None;
                }
                continue;
            }

            let header = trimmed
                .strip_prefix("constant function ")
                .or_else(|| trimmed.strip_prefix("function "));
            if let Some(header) = header {
                let name = header.split_whitespace().next().unwrap_or_default();
                let indent = line.len() - line.trim_start().len();
                open = Some((name, line_start + indent));
            }
        }

        if let Some((name, start)) = open {
            bodies.push(FunctionBody {
                name,
                start,
                text: &text[start..],
            });
        }

        bodies
    }

    /// Find the function whose body contains `needle`
    pub fn function_containing(&self, needle: &str) -> Option<FunctionBody<'_>> {
        self.function_bodies()
            .into_iter()
            .find(|f| f.text.contains(needle))
    }
}

/// Parse a JASS integer literal: `'hfoo'`, `$1F`, `0x1F` or decimal
///
/// Quoted four-character ids are packed most significant character first.
pub fn parse_jass_int(literal: &str) -> Option<i64> {
    let literal = literal.trim();

    if let Some(inner) = literal
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
    {
        if inner.is_empty() || inner.chars().count() > 4 {
            return None;
        }
        return inner.chars().try_fold(0i64, |acc, c| {
            let code = u32::from(c);
            (code <= 0xFF).then(|| (acc << 8) | i64::from(code))
        });
    }

    let (negative, digits) = match literal.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, literal),
    };

    let value = if let Some(hex) = digits.strip_prefix('$') {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };

    Some(if negative { -value } else { value })
}

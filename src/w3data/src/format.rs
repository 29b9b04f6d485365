//! Display formatting of object field text
//!
//! Game text uses inline control sequences:
//! - `|cAARRGGBB` starts colored text, `|r` ends it
//! - `|n` is a line break
//!
//! [`TextFormatter::format_text`] turns these into HTML fragments for display;
//! [`TextFormatter::strip_text`] removes them for machine consumption.

use crate::record::Value;
use crate::strings::StringTable;
use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder the map authors left in unused descriptions
pub const PLACEHOLDER_TEXT: &str = "fuck you";

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:\|r\s?)?\|n").unwrap());

static CONTROL_SEQUENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|n|\|c[a-fA-F0-9]{8}|\|r").unwrap());

#[derive(Debug, Clone, Default)]
pub struct TextFormatter {
    strings: StringTable,
}

impl TextFormatter {
    pub fn new(strings: StringTable) -> Self {
        Self { strings }
    }

    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    /// Substitute a string table reference, if `text` is one
    pub fn resolve<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, str> {
        match self.strings.resolve_reference(text) {
            Some(resolved) => resolved.into(),
            None => text.into(),
        }
    }

    /// Full display pipeline: references, placeholder, colors, line breaks
    pub fn format_text(&self, text: &str) -> String {
        let text = self.resolve(text);
        if text.to_lowercase().contains(PLACEHOLDER_TEXT) {
            return String::new();
        }
        let colored = colorize(&text);
        LINE_BREAK.replace_all(&colored, "<br/>").into_owned()
    }

    /// Reference substitution plus removal of control sequences
    pub fn strip_text(&self, text: &str) -> String {
        let text = self.resolve(text);
        CONTROL_SEQUENCE.replace_all(&text, "").into_owned()
    }

    /// Format a value; only text is touched
    pub fn format(&self, value: &Value) -> Value {
        match value {
            Value::Text(s) => Value::Text(self.format_text(s)),
            other => other.clone(),
        }
    }

    pub fn strip(&self, value: &Value) -> Value {
        match value {
            Value::Text(s) => Value::Text(self.strip_text(s)),
            other => other.clone(),
        }
    }
}

fn is_line_end(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Alpha and color of a `|cAARRGGBB` tag at the start of `text`
fn color_tag(text: &str) -> Option<(&str, &str)> {
    let hex = text.strip_prefix("|c")?.get(..8)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Some((&hex[..2], &hex[2..]))
}

/// Rewrite color tags into spans
///
/// Content runs until the first `|r` (consumed), the next `|c` (left in
/// place), a line end, or the end of the text.
fn colorize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find("|c") {
        let Some((alpha, color)) = color_tag(&rest[pos..]) else {
            out.push_str(&rest[..pos + 2]);
            rest = &rest[pos + 2..];
            continue;
        };

        out.push_str(&rest[..pos]);
        let body = &rest[pos + 10..];

        let mut end = body.len();
        let mut consumed = body.len();
        for (i, c) in body.char_indices() {
            if body[i..].starts_with("|r") {
                end = i;
                consumed = i + 2;
                break;
            }
            if body[i..].starts_with("|c") || is_line_end(c) {
                end = i;
                consumed = i;
                break;
            }
        }

        out.push_str(&format!(
            r#"<span class="w3-colored" style="color: #{}{}">{}</span>"#,
            color,
            alpha,
            &body[..end]
        ));
        rest = &body[consumed..];
    }

    out.push_str(rest);
    out
}

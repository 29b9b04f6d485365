//! Conditional block extraction from JASS text
//!
//! A forward-only keyword matcher, not a parser: it tracks `if` nesting and
//! stops at the `else`/`elseif`/`endif` that closes the starting conditional.

use crate::{Error, Result};

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Whether `keyword` stands alone at `pos`
fn keyword_at(bytes: &[u8], pos: usize, keyword: &str) -> bool {
    let kw = keyword.as_bytes();
    let end = pos + kw.len();
    if end > bytes.len() || &bytes[pos..end] != kw {
        return false;
    }
    let before_ok = pos == 0 || !is_ident_byte(bytes[pos - 1]);
    let after_ok = end == bytes.len() || !is_ident_byte(bytes[end]);
    before_ok && after_ok
}

/// Extract the conditional block starting at byte offset `start`
///
/// `text[start..]` must begin with the keyword `if` or `elseif`. The result
/// runs from `start` to:
/// - the `else`/`elseif` of the same depth (exclusive),
/// - the matching `endif` (inclusive),
/// - an `endfunction` at any depth (exclusive), or
/// - the end of the text.
///
/// Keywords only count on identifier boundaries, so `endif` inside
/// `GetEndifCount` or `if` inside `Modifier` are ignored.
///
/// ```
/// let text = "if a then\n if b then\n endif\nendif\ncall X()";
/// let block = w3data::extract_conditional_block(text, 0).unwrap();
/// assert_eq!(block, "if a then\n if b then\n endif\nendif");
/// ```
pub fn extract_conditional_block(text: &str, start: usize) -> Result<&str> {
    let bytes = text.as_bytes();
    if text.get(start..).is_none() {
        return Err(Error::NotAtConditional { position: start });
    }

    let mut i = if keyword_at(bytes, start, "elseif") {
        start + "elseif".len()
    } else if keyword_at(bytes, start, "if") {
        start + "if".len()
    } else {
        return Err(Error::NotAtConditional { position: start });
    };

    let mut depth: i32 = 0;
    while i < bytes.len() {
        if keyword_at(bytes, i, "if") {
            depth += 1;
            i += 2;
        } else if keyword_at(bytes, i, "elseif") || keyword_at(bytes, i, "else") {
            if depth <= 0 {
                return Ok(&text[start..i]);
            }
            i += if keyword_at(bytes, i, "elseif") { 6 } else { 4 };
        } else if keyword_at(bytes, i, "endif") {
            if depth <= 0 {
                return Ok(&text[start..i + 5]);
            }
            depth -= 1;
            i += 5;
        } else if keyword_at(bytes, i, "endfunction") {
            return Ok(&text[start..i]);
        } else {
            i += 1;
        }
    }

    Ok(&text[start..])
}

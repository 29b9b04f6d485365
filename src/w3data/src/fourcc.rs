//! FourCC identifier codec
//!
//! The game packs 4-character ids into a 32-bit integer, most significant
//! byte first: `'hfoo'` is `0x68666F6F` (`1751543663`). Scripts compiled by
//! some map optimizers only ever carry the integer form.

use crate::{Error, Result};

/// Values at or below this decode to an empty string.
///
/// Guards against small non-identifier integers (player slots, counters)
/// that sit in the same script positions as packed ids.
pub const DECODE_THRESHOLD: u64 = 8;

/// Decode a packed integer into its character form
///
/// Emits the low byte as a character and shifts right until the remainder is
/// at or below [`DECODE_THRESHOLD`].
///
/// # Example
///
/// ```
/// assert_eq!(w3data::fourcc::decode(1751543663), "hfoo");
/// assert_eq!(w3data::fourcc::decode(8), "");
/// ```
pub fn decode(value: u64) -> String {
    let mut remaining = value;
    let mut bytes = Vec::with_capacity(4);

    while remaining > DECODE_THRESHOLD {
        bytes.push((remaining % 256) as u8);
        remaining /= 256;
    }

    bytes.iter().rev().map(|&b| char::from(b)).collect()
}

/// Encode the first four characters of an id into a packed integer
///
/// Characters must fit in a byte (the game's ids are ASCII).
pub fn encode(id: &str) -> Result<u32> {
    let mut packed: u32 = 0;
    let mut count = 0;

    for c in id.chars().take(4) {
        let code = u32::from(c);
        if code > 0xFF {
            return Err(Error::InvalidFourCc(id.to_string()));
        }
        packed = (packed << 8) | code;
        count += 1;
    }

    if count < 4 {
        return Err(Error::InvalidFourCc(id.to_string()));
    }

    Ok(packed)
}

/// Decode a decimal integer literal as found in script text
///
/// Non-numeric input decodes to an empty string, like an out-of-range value.
pub fn decode_literal(literal: &str) -> String {
    literal
        .trim()
        .parse::<u64>()
        .map(decode)
        .unwrap_or_default()
}

//! FourCC conversion command handlers

use anyhow::{bail, Result};
use w3data::{decode_literal, encode_fourcc};

/// Pack an id into its script integer
pub fn encode(id: &str) -> Result<()> {
    println!("{}", encode_fourcc(id)?);
    Ok(())
}

/// Unpack a script integer
pub fn decode(value: &str) -> Result<()> {
    let id = decode_literal(value);
    if id.is_empty() {
        bail!("{} is not a packed id", value);
    }
    println!("{}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_rejects_bad_length() {
        assert!(encode("hfoo").is_ok());
        assert!(encode("hfo").is_err());
    }

    #[test]
    fn test_decode() {
        assert!(decode("1751543663").is_ok());
        assert!(decode("'hfoo'").is_err());
        assert!(decode("7").is_err());
    }
}

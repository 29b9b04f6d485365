//! FNV-1a hash, used to fingerprint model paths

/// FNV-1a 64-bit offset basis
pub const FNV1A_OFFSET_BASIS: u64 = 0xcbf29ce484222325;

/// FNV-1a 64-bit prime
pub const FNV1A_PRIME: u64 = 0x100000001b3;

/// Compute FNV-1a 64-bit hash of a byte slice
pub fn fnv1a_hash(data: &[u8]) -> u64 {
    let mut hash = FNV1A_OFFSET_BASIS;
    for &byte in data {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV1A_PRIME);
    }
    hash
}

/// Fingerprint of a model path
///
/// Case, a trailing extension and a leading separator are ignored, so
/// `Units\Human\Farm\Farm.mdx` and `units\human\farm\farm` hash alike.
///
/// ```
/// assert_eq!(
///     w3data::model_hash("\\Buildings\\Farm.mdx"),
///     w3data::model_hash("buildings\\farm"),
/// );
/// ```
pub fn model_hash(path: &str) -> String {
    let mut name = path.to_lowercase();

    if let Some(dot) = name.rfind('.') {
        let ext = &name[dot + 1..];
        if ext.chars().count() >= 2 && ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            name.truncate(dot);
        }
    }
    let name = name
        .strip_prefix(['\\', '/'])
        .unwrap_or(&name);

    format!("{:016x}", fnv1a_hash(name.as_bytes()))
}

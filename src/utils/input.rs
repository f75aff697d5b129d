//! Checks applied to the values a client sends with an upload.

use std::collections::HashSet;

use md5::{Digest, Md5};

/// Compares the presented credential with the configured token.
///
/// Runs in time independent of where the first differing byte is.
pub fn token_matches(presented: &[u8], expected: &[u8]) -> bool {
    if presented.len() != expected.len() {
        return false;
    }
    presented
        .iter()
        .zip(expected)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Last `/`-separated component of a client supplied file name.
pub fn base_name(file_name: &str) -> &str {
    let trimmed = file_name.trim_end_matches('/');
    if trimmed.is_empty() {
        return if file_name.is_empty() { "" } else { "/" };
    }
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Extension of `file_name` including the leading dot, or `""` when there is none.
///
/// Case is preserved: `"A.PNG"` yields `".PNG"`.
pub fn file_extension(file_name: &str) -> &str {
    let name = base_name(file_name);
    match name.rfind('.') {
        Some(idx) => &name[idx..],
        None => "",
    }
}

pub fn is_extension_allowed(file_name: &str, allowed: &HashSet<String>) -> bool {
    allowed.contains(file_extension(file_name))
}

/// Name a file is stored under: hex MD5 of its original name plus the original extension.
///
/// Two uploads with the same original name map to the same stored name.
pub fn hashed_file_name(file_name: &str) -> String {
    let name = base_name(file_name);
    let digest = Md5::digest(name.as_bytes());
    format!("{}{}", hex::encode(digest), file_extension(name))
}

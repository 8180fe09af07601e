//! Stable identifiers derived from construct paths and declaration content.

use md5::Md5;
use sha2::{Digest, Sha256};

const HASH_LEN: usize = 8;

/// Builds a logical id from a construct path.
///
/// Path components are stripped of non-alphanumeric characters and
/// concatenated, then suffixed with the first eight uppercase hex digits of
/// the MD5 of the `/`-joined path. The suffix keeps ids unique when two
/// paths collapse to the same human-readable part.
///
/// # Examples
///
/// ```
/// use samflow::utils::logical_id;
///
/// let id = logical_id(&["Pipeline", "Sam Build", "Role"]);
/// assert!(id.starts_with("PipelineSamBuildRole"));
/// assert_eq!(id.len(), "PipelineSamBuildRole".len() + 8);
/// ```
#[must_use]
pub fn logical_id(path: &[&str]) -> String {
    let readable: String = path
        .iter()
        .flat_map(|component| component.chars())
        .filter(char::is_ascii_alphanumeric)
        .collect();

    let digest = Md5::digest(path.join("/").as_bytes());
    let suffix = hex::encode_upper(digest);

    format!("{readable}{}", &suffix[..HASH_LEN])
}

/// Returns the SHA-256 hex digest of a JSON value.
///
/// `serde_json` maps are key-ordered, so equal values always hash equal.
#[must_use]
pub fn fingerprint(value: &serde_json::Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_id_is_stable() {
        let a = logical_id(&["Pipeline", "Build", "Role"]);
        let b = logical_id(&["Pipeline", "Build", "Role"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_logical_id_distinguishes_paths() {
        // Both collapse to "ABC" but hash differently.
        let a = logical_id(&["A", "BC"]);
        let b = logical_id(&["AB", "C"]);
        assert_ne!(a, b);
        assert!(a.starts_with("ABC"));
        assert!(b.starts_with("ABC"));
    }

    #[test]
    fn test_logical_id_suffix_is_upper_hex() {
        let id = logical_id(&["Sam Deploy"]);
        let suffix = &id["SamDeploy".len()..];
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_fingerprint() {
        let a = fingerprint(&serde_json::json!({"b": 1, "a": 2}));
        let b = fingerprint(&serde_json::json!({"a": 2, "b": 1}));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, fingerprint(&serde_json::json!({"a": 3})));
    }
}

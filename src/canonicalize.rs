use crate::error::{Error, Result};
use crate::types::Key;

/// Normalizes a user-supplied key identifier: strips one `0x`/`0X` prefix
/// and upper-cases the rest.
///
/// Purely textual; never rejects. Identifiers of unusable length or shape
/// pass through unchanged and fail whatever validation applies downstream.
pub fn normalize(name: &str) -> String {
    name.strip_prefix("0x")
        .or_else(|| name.strip_prefix("0X"))
        .unwrap_or(name)
        .to_uppercase()
}

/// Whether an identifier is a collision-prone short (8) or long (16) key ID
/// that should be widened to a full fingerprint.
pub fn is_short_or_long_id(name: &str) -> bool {
    matches!(name.len(), 8 | 16)
}

/// Result of resolving a short or long key ID against installed keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixMatch<'a> {
    /// Exactly one installed primary key ends with the identifier.
    Unique(&'a str),
    /// No installed key matches; the key may simply not be installed yet.
    NoMatch,
    /// Several installed keys share this suffix; widening would guess.
    Ambiguous,
}

/// Resolves a short or long key ID against the installed keys.
///
/// Only a unique suffix match yields a full fingerprint; a collision is
/// reported as [`SuffixMatch::Ambiguous`] rather than silently picking the
/// first hit.
pub fn resolve_suffix<'a>(name: &str, keys: &'a [Key]) -> SuffixMatch<'a> {
    let mut matches = keys
        .iter()
        .filter(|k| k.fingerprint.ends_with(name))
        .map(|k| k.fingerprint.as_str());

    match (matches.next(), matches.next()) {
        (None, _) => SuffixMatch::NoMatch,
        (Some(only), None) => SuffixMatch::Unique(only),
        (Some(_), Some(_)) => SuffixMatch::Ambiguous,
    }
}

/// Validates a key identifier before it is passed to a subprocess.
///
/// Accepts 8, 16 or 40 hex characters, optionally `0x`-prefixed; returns the
/// normalized form. This is the create/delete-time guard against shell
/// metacharacters and typos, not the canonicalization pass.
pub fn validate_keyid(keyid: &str) -> Result<String> {
    if keyid.is_empty() {
        return Err(Error::InvalidKeyId {
            keyid: keyid.to_string(),
            reason: "key ID cannot be empty".to_string(),
        });
    }

    let normalized = normalize(keyid);

    if !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidKeyId {
            keyid: keyid.to_string(),
            reason: "key ID must contain only hexadecimal characters".to_string(),
        });
    }

    match normalized.len() {
        8 | 16 | 40 => Ok(normalized),
        len => Err(Error::InvalidKeyId {
            keyid: keyid.to_string(),
            reason: format!("key ID must be 8, 16, or 40 hex characters (got {})", len),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeyType;

    fn key(fingerprint: &str) -> Key {
        Key {
            fingerprint: fingerprint.to_string(),
            size: 4096,
            key_type: KeyType::Rsa,
            created: None,
            expires: None,
        }
    }

    #[test]
    fn test_normalize_strips_prefix_and_upcases() {
        assert_eq!(normalize("0xabcd"), "ABCD");
        assert_eq!(normalize("0XABCD"), "ABCD");
        assert_eq!(normalize("abcd"), "ABCD");
        assert_eq!(normalize("ABCD"), "ABCD");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let fingerprint = "126C0D24BD8A2942CC7DF8AC7638D0442B90D010";
        assert_eq!(normalize(fingerprint), fingerprint);
        assert_eq!(normalize(&normalize(fingerprint)), fingerprint);
    }

    #[test]
    fn test_normalize_passes_garbage_through() {
        assert_eq!(normalize("not a hex number"), "NOT A HEX NUMBER");
    }

    #[test]
    fn test_is_short_or_long_id() {
        assert!(is_short_or_long_id("2B90D010"));
        assert!(is_short_or_long_id("7638D0442B90D010"));
        assert!(!is_short_or_long_id("ABCD"));
        assert!(!is_short_or_long_id(
            "126C0D24BD8A2942CC7DF8AC7638D0442B90D010"
        ));
    }

    #[test]
    fn test_resolve_suffix_single_match() {
        let keys = vec![
            key("6ED6F5CB5FA6FB2F460AE88EEDA0D2388AE22BA9"),
            key("126C0D24BD8A2942CC7DF8AC7638D0442B90D010"),
        ];
        assert_eq!(
            resolve_suffix("2B90D010", &keys),
            SuffixMatch::Unique("126C0D24BD8A2942CC7DF8AC7638D0442B90D010")
        );
        assert_eq!(
            resolve_suffix("EDA0D2388AE22BA9", &keys),
            SuffixMatch::Unique("6ED6F5CB5FA6FB2F460AE88EEDA0D2388AE22BA9")
        );
    }

    #[test]
    fn test_resolve_suffix_no_match() {
        let keys = vec![key("6ED6F5CB5FA6FB2F460AE88EEDA0D2388AE22BA9")];
        assert_eq!(resolve_suffix("2B90D010", &keys), SuffixMatch::NoMatch);
        assert_eq!(resolve_suffix("2B90D010", &[]), SuffixMatch::NoMatch);
    }

    #[test]
    fn test_resolve_suffix_collision_is_ambiguous() {
        let keys = vec![
            key("AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA2B90D010"),
            key("126C0D24BD8A2942CC7DF8AC7638D0442B90D010"),
        ];
        assert_eq!(resolve_suffix("2B90D010", &keys), SuffixMatch::Ambiguous);
    }

    #[test]
    fn test_valid_keyid_formats() {
        assert_eq!(validate_keyid("DEADBEEF").unwrap(), "DEADBEEF");
        assert_eq!(validate_keyid("deadbeef").unwrap(), "DEADBEEF");
        assert_eq!(
            validate_keyid("786C63F330D7CB92").unwrap(),
            "786C63F330D7CB92"
        );
        assert_eq!(
            validate_keyid("126C0D24BD8A2942CC7DF8AC7638D0442B90D010").unwrap(),
            "126C0D24BD8A2942CC7DF8AC7638D0442B90D010"
        );
        assert_eq!(validate_keyid("0xDEADBEEF").unwrap(), "DEADBEEF");
        assert_eq!(validate_keyid("0XDEADBEEF").unwrap(), "DEADBEEF");
    }

    #[test]
    fn test_invalid_keyid_empty() {
        let err = validate_keyid("").unwrap_err();
        assert!(matches!(err, Error::InvalidKeyId { .. }));
    }

    #[test]
    fn test_invalid_keyid_non_hex() {
        let err = validate_keyid("DEADBEEG").unwrap_err();
        assert!(matches!(err, Error::InvalidKeyId { .. }));
    }

    #[test]
    fn test_invalid_keyid_wrong_length() {
        let err = validate_keyid("DEADBE").unwrap_err();
        assert!(matches!(err, Error::InvalidKeyId { .. }));
    }

    #[test]
    fn test_keyid_injection_attempts_rejected() {
        for attempt in ["$(whoami)", "DEAD BEEF", "arch;linux", "DEAD\nBEEF", "`id`"] {
            let err = validate_keyid(attempt).unwrap_err();
            assert!(matches!(err, Error::InvalidKeyId { .. }), "{attempt}");
        }
    }
}

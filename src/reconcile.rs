use crate::error::{Error, Result};
use crate::types::{DesiredKey, Ensure, Key, KeyChange};

/// What a reconciliation pass decided to do for one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action<'a> {
    Unchanged,
    Create(&'a DesiredKey),
    Delete(&'a str),
}

/// Decides the action for one identifier from observed and declared state.
///
/// Presence is the only reconciled dimension; an installed key that matches
/// a declared one is never re-fetched or drift-corrected.
pub fn decide<'a>(current: Option<&'a Key>, desired: Option<&'a DesiredKey>) -> Action<'a> {
    let wanted = desired.map(|d| d.ensure).unwrap_or(Ensure::Absent);

    match (current, wanted) {
        (None, Ensure::Absent) => Action::Unchanged,
        (Some(_), Ensure::Present) => Action::Unchanged,
        (None, Ensure::Present) => match desired {
            Some(d) => Action::Create(d),
            // Unreachable: `wanted` is Present only when desired is Some.
            None => Action::Unchanged,
        },
        (Some(key), Ensure::Absent) => Action::Delete(&key.fingerprint),
    }
}

/// Rejects declarations that cannot be dispatched, before any side effect.
///
/// `content` and `source` are mutually exclusive; one bad entry fails only
/// its own identifier, never the batch.
pub fn validate(change: &KeyChange) -> Result<()> {
    if let Some(desired) = &change.desired {
        if desired.content.is_some() && desired.source.is_some() {
            return Err(Error::MutuallyExclusive {
                name: change.name.clone(),
            });
        }
    }
    Ok(())
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

    fn desired(ensure: Ensure) -> DesiredKey {
        DesiredKey {
            name: "A".repeat(40),
            ensure,
            server: Some("keyserver.example.com".to_string()),
            ..DesiredKey::default()
        }
    }

    #[test]
    fn test_absent_absent_is_noop() {
        assert_eq!(decide(None, None), Action::Unchanged);
        let d = desired(Ensure::Absent);
        assert_eq!(decide(None, Some(&d)), Action::Unchanged);
    }

    #[test]
    fn test_present_present_is_noop() {
        let k = key(&"A".repeat(40));
        let d = desired(Ensure::Present);
        assert_eq!(decide(Some(&k), Some(&d)), Action::Unchanged);
    }

    #[test]
    fn test_absent_present_creates() {
        let d = desired(Ensure::Present);
        assert_eq!(decide(None, Some(&d)), Action::Create(&d));
    }

    #[test]
    fn test_present_absent_deletes_by_fingerprint() {
        let fingerprint = "126C0D24BD8A2942CC7DF8AC7638D0442B90D010";
        let k = key(fingerprint);
        let d = desired(Ensure::Absent);
        assert_eq!(decide(Some(&k), Some(&d)), Action::Delete(fingerprint));
    }

    #[test]
    fn test_present_undeclared_deletes() {
        let fingerprint = "126C0D24BD8A2942CC7DF8AC7638D0442B90D010";
        let k = key(fingerprint);
        assert_eq!(decide(Some(&k), None), Action::Delete(fingerprint));
    }

    #[test]
    fn test_validate_rejects_content_and_source() {
        let change = KeyChange {
            name: "A".repeat(40),
            current: None,
            desired: Some(DesiredKey {
                name: "A".repeat(40),
                content: Some("some gpg key".to_string()),
                source: Some("/tmp/file".to_string()),
                ..DesiredKey::default()
            }),
        };
        let err = validate(&change).unwrap_err();
        assert!(matches!(err, Error::MutuallyExclusive { .. }));
    }

    #[test]
    fn test_validate_accepts_one_of_each() {
        for (content, source) in [
            (Some("key".to_string()), None),
            (None, Some("/tmp/file".to_string())),
            (None, None),
        ] {
            let change = KeyChange {
                name: "A".repeat(40),
                current: None,
                desired: Some(DesiredKey {
                    name: "A".repeat(40),
                    content,
                    source,
                    ..DesiredKey::default()
                }),
            };
            assert!(validate(&change).is_ok());
        }
    }
}

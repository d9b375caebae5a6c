use chrono::{DateTime, Utc};

/// A GPG key installed in the apt keyring.
///
/// One record per primary key; subkeys are not tracked. The fingerprint is
/// always the full 40 uppercase hex characters as reported by the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub fingerprint: String,
    pub size: u32,
    pub key_type: KeyType,
    pub created: Option<DateTime<Utc>>,
    /// `None` means the key does not expire.
    pub expires: Option<DateTime<Utc>>,
}

impl Key {
    /// The long key ID: the last 16 characters of the fingerprint.
    #[must_use]
    pub fn long(&self) -> &str {
        suffix(&self.fingerprint, 16)
    }

    /// The short key ID: the last 8 characters of the fingerprint.
    #[must_use]
    pub fn short(&self) -> &str {
        suffix(&self.fingerprint, 8)
    }

    /// Whether the key's expiration date has passed.
    ///
    /// Recomputed against the wall clock on every call; never cached.
    #[must_use]
    pub fn expired(&self) -> bool {
        match self.expires {
            Some(expiry) => expiry <= Utc::now(),
            None => false,
        }
    }
}

fn suffix(s: &str, n: usize) -> &str {
    &s[s.len().saturating_sub(n)..]
}

/// The public-key algorithm, from the listing's algorithm code field.
///
/// Codes per /usr/share/doc/gnupg/DETAILS.gz. The mapping is total:
/// an unknown code is a reportable state, not a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum KeyType {
    Rsa,
    Dsa,
    Ecc,
    Ecdsa,
    Unrecognized,
}

impl KeyType {
    pub fn from_code(code: &str) -> Self {
        match code {
            "1" => Self::Rsa,
            "17" => Self::Dsa,
            "18" => Self::Ecc,
            "19" => Self::Ecdsa,
            _ => Self::Unrecognized,
        }
    }
}

impl std::fmt::Display for KeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Rsa => "rsa",
            Self::Dsa => "dsa",
            Self::Ecc => "ecc",
            Self::Ecdsa => "ecdsa",
            Self::Unrecognized => "unrecognized",
        };
        f.write_str(name)
    }
}

/// Whether a key should be installed or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ensure {
    #[default]
    Present,
    Absent,
}

/// An operator-declared key: the identifier plus how to obtain the material.
///
/// `server`, `content` and `source` select the acquisition strategy;
/// `content` and `source` are mutually exclusive, and a keyserver fetch is
/// the fallback when neither is set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DesiredKey {
    /// Key identifier: a short/long key ID or a full fingerprint.
    pub name: String,
    pub ensure: Ensure,
    /// Keyserver to receive the key from.
    pub server: Option<String>,
    /// Extra options passed through to the keyserver.
    pub keyserver_options: Option<String>,
    /// Literal armored key material.
    pub content: Option<String>,
    /// Local path or URI to fetch key material from.
    pub source: Option<String>,
}

impl DesiredKey {
    /// A key that should be present, fetched from the given keyserver.
    #[must_use]
    pub fn from_server(name: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server: Some(server.into()),
            ..Self::default()
        }
    }
}

/// One entry of a reconciliation batch: the observed and the declared state
/// for a single identifier, with absence represented explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChange {
    pub name: String,
    /// `None` means the key is not installed.
    pub current: Option<Key>,
    /// `None` means the key is not declared (equivalent to ensure absent).
    pub desired: Option<DesiredKey>,
}

/// What a reconciliation pass did for one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Created,
    Deleted,
    Unchanged,
}

/// Per-identifier result of a reconciliation pass.
///
/// A failed entry never aborts the batch; callers get one outcome per
/// identifier, in input order.
#[derive(Debug)]
pub struct Outcome {
    pub name: String,
    pub result: crate::Result<Applied>,
}

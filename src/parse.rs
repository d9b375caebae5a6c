use chrono::{DateTime, Utc};
use tracing::debug;

use crate::types::{Key, KeyType};

/// Pending `pub` line fields, carried until the matching `fpr` line arrives.
struct PubFields {
    size: u32,
    key_type: KeyType,
    created: Option<DateTime<Utc>>,
    expires: Option<DateTime<Utc>>,
}

/// Scanner state for pairing `pub` lines with their fingerprint line.
///
/// A `pub` record arms the scanner; the next `fpr` record completes one key
/// and disarms it, so fingerprint lines belonging to subkeys of the same
/// primary key are skipped until the next `pub` record re-arms.
enum Scan {
    AwaitingPub,
    AwaitingFpr(PubFields),
}

/// Parses `--with-colons --fixed-list-mode` key listing output into one
/// [`Key`] per primary key.
///
/// Garbage lines and unknown record types are skipped. A `pub` record with
/// no fingerprint before the next `pub` record yields no key, mirroring
/// GPG's own treatment of incomplete entries.
pub fn parse_keys(output: &str) -> Vec<Key> {
    let mut keys = Vec::new();
    let mut scan = Scan::AwaitingPub;

    for line in output.lines() {
        let fields: Vec<&str> = line.trim().split(':').collect();

        match fields[0] {
            "pub" => {
                if matches!(scan, Scan::AwaitingFpr(_)) {
                    debug!("skipping key: no fingerprint line before next pub record");
                }
                scan = Scan::AwaitingFpr(pub_fields(&fields));
            }
            "fpr" => {
                if let Scan::AwaitingFpr(pending) = scan {
                    scan = Scan::AwaitingPub;
                    match fingerprint_field(&fields) {
                        Some(fingerprint) => keys.push(Key {
                            fingerprint: fingerprint.to_string(),
                            size: pending.size,
                            key_type: pending.key_type,
                            created: pending.created,
                            expires: pending.expires,
                        }),
                        None => debug!("skipping key: empty fingerprint record"),
                    }
                }
            }
            "sub" | "ssb" | "uid" | "uat" | "sig" | "rev" | "rvk" | "tru" => {}
            other if !other.is_empty() => {
                debug!(record_type = other, "skipping unknown GPG record type");
            }
            _ => {}
        }
    }

    if matches!(scan, Scan::AwaitingFpr(_)) {
        debug!("skipping final key: no fingerprint line");
    }

    keys
}

/// Extracts every fingerprint (primary keys and subkeys alike) from
/// `--with-fingerprint --with-colons` output, in listing order.
///
/// Used when verifying fetched key material, where a declared identifier may
/// legitimately name any fingerprint the file contains.
pub fn parse_fingerprints(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| line.trim().split(':').collect::<Vec<&str>>())
        .filter(|fields| fields[0] == "fpr")
        .filter_map(|fields| fingerprint_field(&fields).map(str::to_string))
        .collect()
}

fn pub_fields(fields: &[&str]) -> PubFields {
    PubFields {
        size: fields.get(2).and_then(|s| s.parse().ok()).unwrap_or(0),
        key_type: fields
            .get(3)
            .map(|s| KeyType::from_code(s))
            .unwrap_or(KeyType::Unrecognized),
        created: fields.get(5).and_then(|s| parse_epoch(s)),
        expires: fields.get(6).and_then(|s| parse_epoch(s)),
    }
}

/// The fingerprint is the last populated field of the `fpr` record.
fn fingerprint_field<'a>(fields: &[&'a str]) -> Option<&'a str> {
    fields
        .iter()
        .rev()
        .find(|f| !f.is_empty())
        .copied()
        .filter(|f| *f != "fpr")
}

/// An empty or zero epoch field means "no such date", not 1970.
fn parse_epoch(s: &str) -> Option<DateTime<Utc>> {
    let secs = s.parse::<i64>().ok().filter(|secs| *secs != 0)?;
    DateTime::from_timestamp(secs, 0)
}

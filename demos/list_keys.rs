//! Example: List all keys in the apt keyring
//!
//! Run with: cargo run --example list_keys

use apt_key::{Key, TrustStore};

#[tokio::main]
async fn main() -> apt_key::Result<()> {
    let store = TrustStore::new();
    let keys = store.list_keys().await?;

    println!("Found {} keys in apt keyring\n", keys.len());

    for key in &keys {
        println!("{}", format_key_output(key));
    }

    Ok(())
}

fn format_key_output(key: &Key) -> String {
    let expired_marker = if key.expired() { " [expired]" } else { "" };

    let expires = key
        .expires
        .map(|d| format!(" expires {}", d.format("%Y-%m-%d")))
        .unwrap_or_default();

    format!(
        "{} ({}{})\n    short {} long {}{}{}",
        key.fingerprint,
        key.key_type,
        key.size,
        key.short(),
        key.long(),
        expires,
        expired_marker,
    )
}

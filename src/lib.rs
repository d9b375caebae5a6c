//! Reconcile declared APT signing keys against the apt keyring.
//!
//! This crate converges the keys actually installed on a Debian-family host
//! towards a declared set, for use by a configuration-management runtime.
//! It shells out to `apt-key` and `gpg`, parses their colon-delimited
//! output into Rust types, and exposes three operations: canonicalizing
//! user-supplied key identifiers, listing the installed keys, and applying
//! a batch of presence changes.
//!
//! # Example
//!
//! ```no_run
//! use apt_key::{DesiredKey, KeyChange, TrustStore};
//!
//! #[tokio::main]
//! async fn main() -> apt_key::Result<()> {
//!     let store = TrustStore::new();
//!
//!     let declared = store
//!         .canonicalize(vec![DesiredKey::from_server(
//!             "126C0D24BD8A2942CC7DF8AC7638D0442B90D010",
//!             "keyserver.ubuntu.com",
//!         )])
//!         .await?;
//!
//!     let installed = store.list_keys().await?;
//!     let changes = declared
//!         .into_iter()
//!         .map(|desired| KeyChange {
//!             name: desired.name.clone(),
//!             current: installed
//!                 .iter()
//!                 .find(|k| k.fingerprint == desired.name)
//!                 .cloned(),
//!             desired: Some(desired),
//!         })
//!         .collect();
//!
//!     for outcome in store.set(changes).await {
//!         match outcome.result {
//!             Ok(applied) => println!("{}: {:?}", outcome.name, applied),
//!             Err(err) => eprintln!("{}: {}", outcome.name, err),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Requirements
//!
//! - A Debian-family system with `apt-key` available
//! - Root access for create and delete operations
//! - `gpg` for fingerprint verification of content/source keys (optional;
//!   skipped with a warning when absent)

mod canonicalize;
mod error;
mod fetch;
mod parse;
mod reconcile;
mod runner;
mod trust_store;
mod types;

pub use error::{Error, Result};
pub use fetch::{ContentFetcher, ContentSource, HttpFetcher};
pub use reconcile::{decide, validate, Action};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
pub use trust_store::TrustStore;
pub use types::{Applied, DesiredKey, Ensure, Key, KeyChange, KeyType, Outcome};

use std::io;

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::canonicalize::{self, validate_keyid, SuffixMatch};
use crate::error::{Error, Result};
use crate::fetch::{ContentFetcher, ContentSource, HttpFetcher};
use crate::parse::{parse_fingerprints, parse_keys};
use crate::reconcile::{self, Action};
use crate::runner::{CommandOutput, CommandRunner, SystemRunner};
use crate::types::{Applied, DesiredKey, Key, KeyChange, Outcome};

const APT_KEY: &str = "apt-key";
const GPG: &str = "gpg";

const LIST_ARGS: &[&str] = &[
    "adv",
    "--list-keys",
    "--with-colons",
    "--fingerprint",
    "--fixed-list-mode",
];

/// The apt trust store: reconciles declared signing keys against the keys
/// installed on the host.
///
/// All mutation goes through `apt-key`; key inspection goes through `gpg`.
/// Every call shells out afresh — nothing is cached across calls, so a
/// reconciliation pass always sees current on-disk state.
///
/// # Example
///
/// ```no_run
/// use apt_key::TrustStore;
///
/// # async fn example() -> apt_key::Result<()> {
/// let store = TrustStore::new();
/// for key in store.list_keys().await? {
///     println!("{} ({})", key.fingerprint, key.key_type);
/// }
/// # Ok(())
/// # }
/// ```
pub struct TrustStore<R = SystemRunner, F = HttpFetcher> {
    runner: R,
    fetcher: F,
}

impl TrustStore {
    /// A trust store backed by the host's `apt-key` and `gpg` binaries.
    #[must_use]
    pub fn new() -> Self {
        Self {
            runner: SystemRunner,
            fetcher: HttpFetcher::default(),
        }
    }
}

impl Default for TrustStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CommandRunner, F: ContentFetcher> TrustStore<R, F> {
    /// A trust store over explicit command and content collaborators.
    pub fn with_collaborators(runner: R, fetcher: F) -> Self {
        Self { runner, fetcher }
    }

    /// The command collaborator backing this store.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Lists the keys currently installed in the apt keyring.
    ///
    /// Always a fresh fetch; one record per primary key.
    pub async fn list_keys(&self) -> Result<Vec<Key>> {
        let output = self.runner.run(APT_KEY, LIST_ARGS).await?;
        if !output.success() {
            return Err(Error::AptKey {
                status: output.status,
                stderr: output.stderr,
            });
        }
        if !output.stderr.trim().is_empty() {
            debug!(stderr = %output.stderr.trim(), "apt-key list-keys stderr");
        }
        Ok(parse_keys(&output.stdout))
    }

    /// Rewrites each declared key's name into canonical form, in input order.
    ///
    /// Names are `0x`-stripped and upper-cased. A short (8) or long (16)
    /// key ID additionally gets a collision-attack advisory and is widened
    /// to the full fingerprint when exactly one installed key matches it as
    /// a suffix; otherwise it passes through unchanged and is left for
    /// downstream validation to reject. Idempotent. The installed-key
    /// snapshot is fetched at most once per batch.
    pub async fn canonicalize(&self, mut resources: Vec<DesiredKey>) -> Result<Vec<DesiredKey>> {
        let mut snapshot: Option<Vec<Key>> = None;

        for resource in &mut resources {
            resource.name = canonicalize::normalize(&resource.name);
            if !canonicalize::is_short_or_long_id(&resource.name) {
                continue;
            }

            warn!(
                name = %resource.name,
                "the name should be a full fingerprint (40 characters) to avoid collision attacks"
            );

            if snapshot.is_none() {
                snapshot = Some(self.list_keys().await?);
            }
            if let Some(keys) = &snapshot {
                match canonicalize::resolve_suffix(&resource.name, keys) {
                    SuffixMatch::Unique(fingerprint) => resource.name = fingerprint.to_string(),
                    SuffixMatch::NoMatch => {}
                    SuffixMatch::Ambiguous => warn!(
                        name = %resource.name,
                        "multiple installed keys share this suffix; leaving the name unchanged"
                    ),
                }
            }
        }

        Ok(resources)
    }

    /// Applies a batch of reconciliation changes, one outcome per entry.
    ///
    /// A failing entry is reported in its outcome and never aborts the rest
    /// of the batch. Outcomes are returned in input order.
    pub async fn set(&self, changes: Vec<KeyChange>) -> Vec<Outcome> {
        let mut outcomes = Vec::with_capacity(changes.len());
        for change in changes {
            let result = self.apply(&change).await;
            if let Err(err) = &result {
                warn!(name = %change.name, error = %err, "reconciliation failed");
            }
            outcomes.push(Outcome {
                name: change.name,
                result,
            });
        }
        outcomes
    }

    async fn apply(&self, change: &KeyChange) -> Result<Applied> {
        reconcile::validate(change)?;

        match reconcile::decide(change.current.as_ref(), change.desired.as_ref()) {
            Action::Unchanged => Ok(Applied::Unchanged),
            Action::Create(desired) => {
                self.create(&change.name, desired).await?;
                Ok(Applied::Created)
            }
            Action::Delete(fingerprint) => {
                self.delete(fingerprint).await?;
                Ok(Applied::Deleted)
            }
        }
    }

    async fn create(&self, name: &str, desired: &DesiredKey) -> Result<()> {
        let keyid = validate_keyid(name)?;
        info!(name = %keyid, "creating key");

        if let Some(content) = &desired.content {
            self.add_key_from_content(&keyid, content).await
        } else if let Some(source) = &desired.source {
            let content = self.fetcher.fetch(&ContentSource::parse(source)).await?;
            self.add_key_from_content(&keyid, &content).await
        } else if let Some(server) = &desired.server {
            self.receive_key(&keyid, server, desired.keyserver_options.as_deref())
                .await
        } else {
            Err(Error::MissingDirective {
                name: name.to_string(),
            })
        }
    }

    async fn receive_key(&self, keyid: &str, server: &str, options: Option<&str>) -> Result<()> {
        // apt-key blows up unless --recv-keys is the last argument.
        let mut args = vec!["adv", "--keyserver", server];
        if let Some(options) = options {
            args.push("--keyserver-options");
            args.push(options);
        }
        args.push("--recv-keys");
        args.push(keyid);

        let output = self.run_apt_key(&args).await?;
        // apt-key may write warnings to stdout instead of stderr.
        if !output.stdout.trim().is_empty() {
            info!(stdout = %output.stdout.trim(), "apt-key output");
        }
        Ok(())
    }

    async fn delete(&self, fingerprint: &str) -> Result<()> {
        let keyid = validate_keyid(fingerprint)?;
        info!(fingerprint = %keyid, "deleting key");

        // `apt-key del` with a full fingerprint fails to delete on some
        // apt/gpg combinations while still exiting 0, so deletion uses the
        // short ID despite the collision risk.
        // Ref: https://bugs.launchpad.net/ubuntu/+source/apt/+bug/1481871
        let short = &keyid[keyid.len().saturating_sub(8)..];
        self.run_apt_key(&["del", short]).await?;
        Ok(())
    }

    /// Writes key material to a scoped temp file, verifies its fingerprint
    /// against the declared identifier, and feeds it to `apt-key add`.
    ///
    /// The temp file is removed when the handle drops, on every exit path.
    async fn add_key_from_content(&self, keyid: &str, content: &str) -> Result<()> {
        let file = NamedTempFile::new()?;
        tokio::fs::write(file.path(), content).await?;
        let path = file.path().to_string_lossy().into_owned();

        self.verify_content(keyid, &path).await?;
        self.run_apt_key(&["add", &path]).await?;
        Ok(())
    }

    /// Checks that the declared identifier names one of the fingerprints in
    /// the key material: either exactly, or as a short/long-ID suffix.
    ///
    /// A host without `gpg` gets a warning and no verification instead of a
    /// hard failure.
    async fn verify_content(&self, keyid: &str, path: &str) -> Result<()> {
        let output = match self
            .runner
            .run(GPG, &["--with-fingerprint", "--with-colons", path])
            .await
        {
            Ok(output) => output,
            Err(Error::Command(e)) if e.kind() == io::ErrorKind::NotFound => {
                warn!("gpg cannot be found for verification of the fingerprint");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if !output.success() {
            return Err(Error::Gpg {
                status: output.status,
                stderr: output.stderr,
            });
        }

        let extracted = parse_fingerprints(&output.stdout);
        if extracted.iter().any(|f| f == keyid) {
            debug!("fingerprint verified against extracted key");
            Ok(())
        } else if extracted.iter().any(|f| f.ends_with(keyid)) {
            debug!("fingerprint matches the extracted key");
            Ok(())
        } else {
            Err(Error::FingerprintMismatch {
                declared: keyid.to_string(),
                extracted,
            })
        }
    }

    async fn run_apt_key(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = self.runner.run(APT_KEY, args).await?;
        if !output.success() {
            return Err(Error::AptKey {
                status: output.status,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }
}

use std::io;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("command execution failed: {0}")]
    Command(#[from] io::Error),

    #[error("apt-key exited with status {status}: {stderr}")]
    AptKey { status: i32, stderr: String },

    #[error("gpg exited with status {status}: {stderr}")]
    Gpg { status: i32, stderr: String },

    #[error("invalid key ID '{keyid}': {reason}")]
    InvalidKeyId { keyid: String, reason: String },

    #[error("the properties `content` and `source` are both set for '{name}', but mutually exclusive")]
    MutuallyExclusive { name: String },

    #[error("cannot create key '{name}': none of `server`, `content`, or `source` is set")]
    MissingDirective { name: String },

    #[error(
        "the declared fingerprint ({declared}) and the fingerprint from content/source \
         ({extracted:?}) do not match; check the name, or check the content/source is legitimate"
    )]
    FingerprintMismatch {
        declared: String,
        extracted: Vec<String>,
    },

    #[error("the file {path} does not exist")]
    SourceNotFound { path: String },

    #[error("{message} for {uri}")]
    Http { uri: String, message: String },

    #[error("could not resolve or connect to {uri}")]
    Resolve { uri: String },
}

pub type Result<T> = std::result::Result<T, Error>;

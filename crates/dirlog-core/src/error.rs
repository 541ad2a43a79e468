/// Error types for each step of a run.
///
/// Only [`DispatchError`] is recovered by the pipeline; everything else
/// ends the run with a diagnostic.
use std::io;
use std::path::PathBuf;

/// The traversal root could not be used. No log is produced.
#[derive(Debug, thiserror::Error)]
pub enum TraversalSetupError {
    #[error("path does not exist: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TraversalSetupError {
    /// The root path that failed.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound { path } | Self::NotADirectory { path } | Self::Unreadable { path, .. } => {
                path
            }
        }
    }
}

/// Creating or writing the log artifact failed.
#[derive(Debug, thiserror::Error)]
#[error("failed to write log {}: {source}", path.display())]
pub struct LogWriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Any failure while sending the log by email.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid email address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("no SMTP credentials configured (set DIRLOG_SMTP_USERNAME and DIRLOG_SMTP_PASSWORD)")]
    MissingCredentials,

    #[error("cannot read attachment {}: {source}", path.display())]
    Attachment {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("connection to {host}:{port} failed: {source}")]
    Connection {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("I/O error during SMTP session: {0}")]
    Io(#[from] io::Error),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("server rejected {stage} with {code}: {message}")]
    Rejected {
        stage: &'static str,
        code: u16,
        message: String,
    },

    #[error("SMTP protocol error: {0}")]
    Protocol(String),

    #[error("server does not support {0}")]
    NotSupported(&'static str),
}

impl DispatchError {
    /// Builds an [`InvalidAddress`](Self::InvalidAddress) error.
    pub fn invalid_address(address: &str, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.to_string(),
            reason: reason.into(),
        }
    }
}

/// Moving the artifact to the trash failed.
#[derive(Debug, thiserror::Error)]
pub enum DisposeError {
    #[error("no trash location available on this system")]
    NoTrashLocation,

    #[error("cannot trash {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("recycle bin operation on {} failed with code {code}", path.display())]
    Shell { path: PathBuf, code: i32 },
}

/// Configuration could not be loaded or is invalid.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid environment override {name}={value:?}: {details}")]
    Env {
        name: &'static str,
        value: String,
        details: String,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

use std::path::PathBuf;

use vsix_core::HostVersion;

/// Errors raised while binding or driving an extension manager.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] vsix_core::Error),

    /// No implementation accepts the interface as it resolves in this boundary.
    #[error("no extension manager binding for {version}: {reason}")]
    BindingNotFound { version: HostVersion, reason: String },

    /// The package is not a readable extension.
    #[error("invalid extension package {path}: {reason}")]
    InvalidPackage { path: PathBuf, reason: String },

    #[error("failed to read archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("extension '{0}' is not installed")]
    NotInstalled(String),

    #[error("extension '{0}' is already installed")]
    AlreadyInstalled(String),

    #[error("extension index at {path} is corrupt: {reason}")]
    StoreCorrupt { path: PathBuf, reason: String },

    #[error("invalid filter '{pattern}': {source}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to lock {0}")]
    LockFailed(PathBuf),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

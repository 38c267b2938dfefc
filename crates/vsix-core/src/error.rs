//! Error types for vsix-core

use std::path::PathBuf;

/// Result type for vsix-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vsix-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported host version: {0}")]
    UnsupportedVersion(String),

    #[error("Invalid module identity '{identity}': {message}")]
    InvalidIdentity { identity: String, message: String },

    #[error("Module '{name}' could not be resolved under {base}")]
    ModuleNotFound { name: String, base: PathBuf },

    #[error("Malformed binding redirect at {path}: {message}")]
    MalformedRedirect { path: PathBuf, message: String },

    #[error("Failed to parse config at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

use std::path::PathBuf;

use vsix_core::HostVersion;

/// Errors raised while creating, using or tearing down execution boundaries.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] vsix_core::Error),

    #[error(transparent)]
    Extensions(#[from] vsix_extensions::Error),

    #[error("failed to create boundary for {version}: {reason}")]
    BoundaryCreation { version: HostVersion, reason: String },

    /// The context was used after [`dispose`](crate::IsolationContext::dispose).
    #[error("isolation context has been disposed")]
    ContextDisposed,

    #[error("boundary for {0} exited before completing the command")]
    BoundaryExited(HostVersion),

    #[error("malformed boundary message: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("boundary pipe failed: {0}")]
    Pipe(#[source] std::io::Error),

    /// A command failed inside an isolated boundary.
    #[error("{0}")]
    Remote(String),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

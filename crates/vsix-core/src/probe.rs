//! Installation-relative module probing.
//!
//! The host product keeps its modules next to the application executable and
//! in two dependency directories beneath it. An [`AssemblyProbe`] searches
//! those directories in the configured order and nothing else; when nothing
//! matches, the caller falls back to its own default resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::identity::ModuleIdentity;
use crate::version::InstalledVersion;

/// File extension of a loadable module.
pub const MODULE_EXTENSION: &str = "dll";

/// Default probe order: the application directory, then private, then public
/// dependencies. Matches the host product's own layout.
pub const DEFAULT_PROBE_SUBPATHS: [&str; 3] = [".", "PrivateAssemblies", "PublicAssemblies"];

/// Where to probe for modules. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    base_directory: PathBuf,
    probe_subpaths: Vec<String>,
}

impl ProbeConfig {
    /// Build a probe configuration. Subpath order is kept exactly as given,
    /// duplicates included.
    pub fn new<I, S>(base_directory: impl Into<PathBuf>, probe_subpaths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            base_directory: base_directory.into(),
            probe_subpaths: probe_subpaths.into_iter().map(Into::into).collect(),
        }
    }

    /// Default probe configuration rooted at the installation's application
    /// directory.
    pub fn for_installation(installed: &InstalledVersion) -> Self {
        Self::new(installed.application_dir(), DEFAULT_PROBE_SUBPATHS)
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn probe_subpaths(&self) -> &[String] {
        &self.probe_subpaths
    }
}

/// Resolves module names to files using a [`ProbeConfig`].
#[derive(Debug, Clone)]
pub struct AssemblyProbe {
    config: ProbeConfig,
}

impl AssemblyProbe {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Candidate paths for `name`, in probe order.
    ///
    /// `name` may be a simple module name or a full identity string; only the
    /// simple name is used to build the file name.
    pub fn candidates<'a>(&'a self, name: &str) -> impl Iterator<Item = PathBuf> + 'a {
        let file_name = format!("{}.{}", ModuleIdentity::simple_name(name), MODULE_EXTENSION);
        self.config
            .probe_subpaths
            .iter()
            .map(move |subpath| self.config.base_directory.join(subpath).join(&file_name))
    }

    /// Return the first candidate that exists as a file.
    ///
    /// Never fails: `None` means the request is left to the default loader.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let found = self.candidates(name).find(|path| path.is_file());
        match &found {
            Some(path) => tracing::debug!(module = name, path = %path.display(), "Probe resolved module"),
            None => tracing::trace!(module = name, base = %self.config.base_directory.display(), "Probe found no match"),
        }
        found
    }
}

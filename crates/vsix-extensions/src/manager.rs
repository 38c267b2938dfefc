//! The extension-manager capability.
//!
//! [`ExtensionManager`] is the surface the command runner drives. Every host
//! version supplies one through its adapter; the trait never crosses a
//! boundary, only the data it returns does.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Identifying metadata read from a package manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionHeader {
    pub identifier: String,
    pub name: String,
    pub version: String,
    pub all_users: bool,
}

/// A package that has been read but not installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallableExtension {
    pub header: ExtensionHeader,
    pub package_path: PathBuf,
}

/// An extension recorded by a manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledExtension {
    pub header: ExtensionHeader,
    pub install_path: PathBuf,
    pub installed_at: DateTime<Utc>,
    pub enabled: bool,
    #[serde(default)]
    pub per_machine: bool,
}

/// Result of asking a manager to rewrite a header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderOverride {
    Applied,
    /// This manager's header has no writable override point.
    Unsupported,
}

pub trait ExtensionManager {
    /// Read the package at `path`.
    fn create_installable(&self, path: &Path) -> Result<InstallableExtension>;

    /// Install a package. Fails when the same identifier is already present.
    fn install(&mut self, extension: &InstallableExtension, per_machine: bool) -> Result<()>;

    fn uninstall(&mut self, extension: &InstalledExtension) -> Result<()>;

    fn get_installed(&self, identifier: &str) -> Result<Option<InstalledExtension>>;

    /// Every installed extension, in installation order.
    fn list_installed(&self) -> Result<Vec<InstalledExtension>>;

    fn enable(&mut self, extension: &InstalledExtension) -> Result<()>;

    /// Force the `AllUsers` header flag to `value`.
    fn override_all_users(
        &self,
        _extension: &mut InstallableExtension,
        _value: bool,
    ) -> HeaderOverride {
        HeaderOverride::Unsupported
    }
}

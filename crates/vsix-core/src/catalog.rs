//! Discovery of installed host versions.

use std::path::{Path, PathBuf};

use crate::config::ToolConfig;
use crate::error::Result;
use crate::version::{HostVersion, InstalledVersion};

/// Relative path of the application executable inside an installation.
const APPLICATION_SUBPATH: [&str; 3] = ["Common7", "IDE", "devenv.exe"];

/// Supplies the installations to operate on.
pub trait VersionCatalog {
    fn installed_versions(&self) -> Result<Vec<InstalledVersion>>;
}

/// Finds installations at their default locations under Program Files, plus
/// any declared in the config file.
///
/// Only installations whose application executable exists are returned.
#[derive(Debug, Clone, Default)]
pub struct DirectoryCatalog {
    program_files: Option<PathBuf>,
    skus: Vec<String>,
    declared: Vec<InstalledVersion>,
}

impl DirectoryCatalog {
    pub fn new(program_files: Option<PathBuf>, skus: Vec<String>) -> Self {
        Self {
            program_files,
            skus,
            declared: Vec::new(),
        }
    }

    /// Build from the tool configuration.
    ///
    /// Declared installations with an unsupported version are skipped with a
    /// warning rather than failing discovery.
    pub fn from_config(config: &ToolConfig) -> Self {
        let declared = config
            .installations
            .iter()
            .filter_map(|entry| match entry.to_installed() {
                Ok(installed) => Some(installed),
                Err(e) => {
                    tracing::warn!(path = %entry.path.display(), error = %e, "Skipping declared installation");
                    None
                }
            })
            .collect();

        Self {
            program_files: config.program_files(),
            skus: config.skus(),
            declared,
        }
    }

    pub fn with_declared(mut self, installed: InstalledVersion) -> Self {
        self.declared.push(installed);
        self
    }

    fn legacy_versions(&self, root: &Path) -> Vec<InstalledVersion> {
        HostVersion::ALL
            .into_iter()
            .filter(|v| *v != HostVersion::Vs2017)
            .filter_map(|version| {
                let mut path = root.join(format!("Microsoft Visual Studio {}.0", version.major()));
                path.extend(APPLICATION_SUBPATH);
                path.is_file().then(|| InstalledVersion::new(path, version))
            })
            .collect()
    }

    fn sku_versions(&self, root: &Path) -> Vec<InstalledVersion> {
        let year = HostVersion::Vs2017.year().to_string();
        self.skus
            .iter()
            .filter_map(|sku| {
                let mut path = root.join("Microsoft Visual Studio").join(&year).join(sku);
                path.extend(APPLICATION_SUBPATH);
                path.is_file()
                    .then(|| InstalledVersion::new(path, HostVersion::Vs2017).with_product(sku))
            })
            .collect()
    }
}

impl VersionCatalog for DirectoryCatalog {
    fn installed_versions(&self) -> Result<Vec<InstalledVersion>> {
        let mut found = Vec::new();

        if let Some(root) = &self.program_files {
            found.extend(self.legacy_versions(root));
            found.extend(self.sku_versions(root));
        }

        for installed in &self.declared {
            if !installed.application_path().is_file() {
                tracing::debug!(path = %installed.application_path().display(), "Declared installation not found");
                continue;
            }
            if !found.contains(installed) {
                found.push(installed.clone());
            }
        }

        tracing::debug!(count = found.len(), "Discovered installations");
        Ok(found)
    }
}

/// `/version` and `/product` selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionFilter {
    pub version: Option<String>,
    pub product: Option<String>,
}

impl VersionFilter {
    pub fn new(version: Option<String>, product: Option<String>) -> Self {
        Self { version, product }
    }

    pub fn matches(&self, installed: &InstalledVersion) -> bool {
        let version_ok = match self.version.as_deref() {
            None | Some("") => true,
            Some(tag) => installed.version().matches_tag(tag),
        };
        let product_ok = match self.product.as_deref() {
            None | Some("") => true,
            Some(product) => installed.matches_product(product),
        };
        version_ok && product_ok
    }

    /// Keep the matching installations, preserving order.
    pub fn apply(&self, installed: Vec<InstalledVersion>) -> Vec<InstalledVersion> {
        installed.into_iter().filter(|i| self.matches(i)).collect()
    }
}

//! Filesystem-backed extension manager.
//!
//! Each host version keeps its per-user extensions under
//! `{settings_root}/{major}.0{root_suffix}/Extensions`. Every extension is
//! extracted into its own directory, named from a hash of its identifier, and
//! recorded in `extensions.json` in the order it was installed.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use vsix_core::HostVersion;

use crate::error::{Error, Result};
use crate::manager::{
    ExtensionManager, HeaderOverride, InstallableExtension, InstalledExtension,
};
use crate::package;

pub const INDEX_FILENAME: &str = "extensions.json";

/// Settings for one `(application, root suffix)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsStore {
    application_path: PathBuf,
    root_suffix: String,
    extensions_dir: PathBuf,
}

impl SettingsStore {
    /// Open the settings for `application_path` under `root_suffix`.
    ///
    /// Nothing is created on disk until the first install.
    pub fn create_for_application(
        settings_root: &Path,
        version: HostVersion,
        application_path: &str,
        root_suffix: &str,
    ) -> Self {
        let hive = format!("{}.0{}", version.major(), root_suffix);
        Self {
            application_path: PathBuf::from(application_path),
            root_suffix: root_suffix.to_string(),
            extensions_dir: settings_root.join(hive).join("Extensions"),
        }
    }

    pub fn application_path(&self) -> &Path {
        &self.application_path
    }

    pub fn root_suffix(&self) -> &str {
        &self.root_suffix
    }

    pub fn extensions_dir(&self) -> &Path {
        &self.extensions_dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.extensions_dir.join(INDEX_FILENAME)
    }

    /// Directory for per-machine installs, next to the application.
    pub fn machine_extensions_dir(&self) -> PathBuf {
        self.application_path
            .parent()
            .map(|dir| dir.join("Extensions"))
            .unwrap_or_else(|| PathBuf::from("Extensions"))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ExtensionIndex {
    extensions: Vec<InstalledExtension>,
}

/// [`ExtensionManager`] over a [`SettingsStore`].
#[derive(Debug)]
pub struct LocalExtensionManager {
    store: SettingsStore,
    header_writable: bool,
}

impl LocalExtensionManager {
    pub fn new(store: SettingsStore, header_writable: bool) -> Self {
        Self {
            store,
            header_writable,
        }
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    fn load_index(&self) -> Result<ExtensionIndex> {
        let path = self.store.index_path();
        if !path.exists() {
            return Ok(ExtensionIndex::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        serde_json::from_str(&content).map_err(|e| Error::StoreCorrupt {
            path,
            reason: e.to_string(),
        })
    }

    fn save_index(&self, index: &ExtensionIndex) -> Result<()> {
        let path = self.store.index_path();
        let content = serde_json::to_vec_pretty(index).map_err(|e| Error::StoreCorrupt {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        write_atomic(&path, &content)
    }
}

/// Directory name for an extension: the first 32 hex digits of the SHA-256
/// of its identifier.
pub fn install_dir_name(identifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identifier.as_bytes());
    let hex = format!("{:x}", hasher.finalize());
    hex[..32].to_string()
}

/// Write `content` to `path` through a locked temp file and rename.
fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .lock_exclusive()
        .map_err(|_| Error::LockFailed(path.to_path_buf()))?;
    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;
    temp_file
        .unlock()
        .map_err(|_| Error::LockFailed(path.to_path_buf()))?;

    fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;
    Ok(())
}

impl ExtensionManager for LocalExtensionManager {
    fn create_installable(&self, path: &Path) -> Result<InstallableExtension> {
        let header = package::read_header(path)?;
        tracing::debug!(identifier = %header.identifier, path = %path.display(), "Read package");
        Ok(InstallableExtension {
            header,
            package_path: path.to_path_buf(),
        })
    }

    fn install(&mut self, extension: &InstallableExtension, per_machine: bool) -> Result<()> {
        let identifier = &extension.header.identifier;
        if extension.header.all_users && !per_machine {
            tracing::warn!(%identifier, "Package declares AllUsers; installing per user");
        }

        let mut index = self.load_index()?;
        if index
            .extensions
            .iter()
            .any(|e| &e.header.identifier == identifier)
        {
            return Err(Error::AlreadyInstalled(identifier.clone()));
        }

        let root = if per_machine {
            self.store.machine_extensions_dir()
        } else {
            self.store.extensions_dir().to_path_buf()
        };
        let install_path = root.join(install_dir_name(identifier));
        if install_path.exists() {
            fs::remove_dir_all(&install_path).map_err(|e| Error::io(&install_path, e))?;
        }
        package::extract(&extension.package_path, &install_path)?;

        index.extensions.push(InstalledExtension {
            header: extension.header.clone(),
            install_path,
            installed_at: Utc::now(),
            enabled: false,
            per_machine,
        });
        self.save_index(&index)?;

        tracing::info!(identifier = %identifier, per_machine, "Installed extension");
        Ok(())
    }

    fn uninstall(&mut self, extension: &InstalledExtension) -> Result<()> {
        let identifier = &extension.header.identifier;
        let mut index = self.load_index()?;
        let position = index
            .extensions
            .iter()
            .position(|e| &e.header.identifier == identifier)
            .ok_or_else(|| Error::NotInstalled(identifier.clone()))?;

        let removed = index.extensions.remove(position);
        if removed.install_path.exists() {
            fs::remove_dir_all(&removed.install_path)
                .map_err(|e| Error::io(&removed.install_path, e))?;
        }
        self.save_index(&index)?;

        tracing::info!(identifier = %identifier, "Uninstalled extension");
        Ok(())
    }

    fn get_installed(&self, identifier: &str) -> Result<Option<InstalledExtension>> {
        Ok(self
            .load_index()?
            .extensions
            .into_iter()
            .find(|e| e.header.identifier == identifier))
    }

    fn list_installed(&self) -> Result<Vec<InstalledExtension>> {
        Ok(self.load_index()?.extensions)
    }

    fn enable(&mut self, extension: &InstalledExtension) -> Result<()> {
        let identifier = &extension.header.identifier;
        let mut index = self.load_index()?;
        let entry = index
            .extensions
            .iter_mut()
            .find(|e| &e.header.identifier == identifier)
            .ok_or_else(|| Error::NotInstalled(identifier.clone()))?;

        if !entry.enabled {
            entry.enabled = true;
            self.save_index(&index)?;
        }
        Ok(())
    }

    fn override_all_users(
        &self,
        extension: &mut InstallableExtension,
        value: bool,
    ) -> HeaderOverride {
        if !self.header_writable {
            return HeaderOverride::Unsupported;
        }
        extension.header.all_users = value;
        HeaderOverride::Applied
    }
}

//! Binding the tool's calling convention to one version's extension manager.

use std::path::{Path, PathBuf};

use vsix_core::{HostVersion, ModuleLoader};

use crate::adapter::VersionAdapter;
use crate::error::{Error, Result};
use crate::store::{LocalExtensionManager, SettingsStore};

/// Builds extension managers through the modules visible to one boundary.
///
/// The binder holds no state of its own beyond the loader it borrows, so it
/// can only resolve what that boundary's probe and redirect allow.
pub struct ExtensionManagerBinder<'a> {
    loader: &'a ModuleLoader,
    settings_root: PathBuf,
}

impl<'a> ExtensionManagerBinder<'a> {
    pub fn new(loader: &'a ModuleLoader, settings_root: impl Into<PathBuf>) -> Self {
        Self {
            loader,
            settings_root: settings_root.into(),
        }
    }

    /// Create the extension manager for `version`.
    ///
    /// Loads the version's settings module, opens the settings store for
    /// `(application_path, root_suffix)`, loads the implementation module and
    /// checks it accepts the interface as this boundary resolves it.
    pub fn bind(
        &self,
        version: HostVersion,
        application_path: &Path,
        root_suffix: &str,
    ) -> Result<LocalExtensionManager> {
        let adapter = VersionAdapter::for_version(version);

        let settings = self.loader.load(&adapter.settings_module())?;
        tracing::debug!(module = %settings.identity, path = %settings.path.display(), "Loaded settings module");

        let store = SettingsStore::create_for_application(
            &self.settings_root,
            version,
            &application_path.to_string_lossy(),
            root_suffix,
        );

        let implementation = self.loader.load(&adapter.implementation_module())?;
        let interface = self.loader.load(&VersionAdapter::interface_module())?;

        let accepted = interface
            .identity
            .version
            .is_some_and(|effective| adapter.accepts_interface(effective));
        if !accepted {
            return Err(Error::BindingNotFound {
                version,
                reason: format!(
                    "{} has no constructor for {}",
                    implementation.identity, interface.identity
                ),
            });
        }

        tracing::debug!(%version, interface = %interface.identity, "Bound extension manager");
        Ok(LocalExtensionManager::new(store, adapter.header_writable))
    }
}

//! [`FakeHost`] builder for host installation scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use vsix_core::{HostVersion, InstalledVersion};

/// File names of the three vendor modules a working installation carries:
/// the extension-manager interface, the settings module and the
/// implementation module.
pub fn vendor_module_names(version: HostVersion) -> [String; 3] {
    let suffix = match version {
        HostVersion::Vs2010 => "",
        HostVersion::Vs2012 => ".11.0",
        HostVersion::Vs2013 => ".12.0",
        HostVersion::Vs2015 => ".14.0",
        HostVersion::Vs2017 => ".15.0",
    };
    [
        "Microsoft.VisualStudio.ExtensionManager.dll".to_string(),
        format!("Microsoft.VisualStudio.Settings{}.dll", suffix),
        "Microsoft.VisualStudio.ExtensionManager.Implementation.dll".to_string(),
    ]
}

/// Lay the vendor modules out the way the host does: the interface next to
/// the executable, settings and implementation under `PrivateAssemblies`.
pub fn install_vendor_modules(application_dir: &Path, version: HostVersion) {
    let [interface, settings, implementation] = vendor_module_names(version);
    let private = application_dir.join("PrivateAssemblies");
    fs::create_dir_all(&private).unwrap();
    fs::write(application_dir.join(interface), b"module").unwrap();
    fs::write(private.join(settings), b"module").unwrap();
    fs::write(private.join(implementation), b"module").unwrap();
}

/// A temporary machine: a Program Files root holding fake installations, a
/// settings root for per-user extension data, and an optional config file.
///
/// # Example
///
/// ```rust,no_run
/// use vsix_core::HostVersion;
/// use vsix_test_utils::FakeHost;
///
/// let host = FakeHost::new();
/// host.add_legacy(HostVersion::Vs2015);
/// host.add_sku("Community");
/// let config = host.write_config();
/// ```
pub struct FakeHost {
    temp_dir: TempDir,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    pub fn new() -> Self {
        let host = Self {
            temp_dir: TempDir::new().unwrap(),
        };
        fs::create_dir_all(host.program_files()).unwrap();
        fs::create_dir_all(host.settings_root()).unwrap();
        host
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn program_files(&self) -> PathBuf {
        self.root().join("Program Files")
    }

    pub fn settings_root(&self) -> PathBuf {
        self.root().join("settings")
    }

    /// Add a legacy-layout installation with all vendor modules present.
    pub fn add_legacy(&self, version: HostVersion) -> InstalledVersion {
        let installed = self.add_legacy_without_modules(version);
        install_vendor_modules(&installed.application_dir(), version);
        installed
    }

    /// Add a legacy-layout installation that has an executable but no vendor
    /// modules, so binding against it fails.
    pub fn add_legacy_without_modules(&self, version: HostVersion) -> InstalledVersion {
        let dir = self
            .program_files()
            .join(format!("Microsoft Visual Studio {}.0", version.major()));
        InstalledVersion::new(create_application(&dir), version)
    }

    /// Add a 2017 installation for `sku` with all vendor modules present.
    pub fn add_sku(&self, sku: &str) -> InstalledVersion {
        let dir = self
            .program_files()
            .join("Microsoft Visual Studio")
            .join("2017")
            .join(sku);
        let installed =
            InstalledVersion::new(create_application(&dir), HostVersion::Vs2017).with_product(sku);
        install_vendor_modules(&installed.application_dir(), HostVersion::Vs2017);
        installed
    }

    /// Directory of the per-user extension store for `version`.
    pub fn extensions_dir(&self, version: HostVersion, root_suffix: &str) -> PathBuf {
        self.settings_root()
            .join(format!("{}.0{}", version.major(), root_suffix))
            .join("Extensions")
    }

    /// Write `config.toml` pointing the tool at this host and return its path.
    pub fn write_config(&self) -> PathBuf {
        let path = self.root().join("config.toml");
        let content = format!(
            "program_files = {:?}\nsettings_root = {:?}\n",
            self.program_files().to_string_lossy(),
            self.settings_root().to_string_lossy(),
        );
        fs::write(&path, content).unwrap();
        path
    }
}

/// Create `{install_dir}/Common7/IDE/devenv.exe` and return its path.
fn create_application(install_dir: &Path) -> PathBuf {
    let ide = install_dir.join("Common7").join("IDE");
    fs::create_dir_all(&ide).unwrap();
    let path = ide.join("devenv.exe");
    fs::write(&path, b"").unwrap();
    path
}

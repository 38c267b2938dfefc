//! Tool configuration.
//!
//! Everything has a default, so the file is optional. It is located by the
//! `VSIXUTIL_CONFIG` environment variable, or `config.toml` in the
//! `vsixutil` folder of the user's config directory.
//!
//! ```toml
//! program_files = "C:/Program Files (x86)"
//! skus = ["Enterprise", "Professional", "Community"]
//! settings_root = "D:/vs-data"
//!
//! [[installations]]
//! path = "D:/VS/Common7/IDE/devenv.exe"
//! version = "14"
//! product = "Portable"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::version::{HostVersion, InstalledVersion};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "VSIXUTIL_CONFIG";

/// Default 2017 product editions, in preference order.
pub const DEFAULT_SKUS: [&str; 3] = ["Community", "Professional", "Enterprise"];

/// An installation declared in the config file instead of discovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredInstallation {
    pub path: PathBuf,
    /// Major number or release year, e.g. `"14"` or `"2015"`.
    pub version: String,
    #[serde(default)]
    pub product: Option<String>,
}

impl DeclaredInstallation {
    pub fn to_installed(&self) -> Result<InstalledVersion> {
        let version: HostVersion = self.version.parse()?;
        let installed = InstalledVersion::new(&self.path, version);
        Ok(match &self.product {
            Some(product) => installed.with_product(product),
            None => installed,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Root holding the `Microsoft Visual Studio*` folders.
    pub program_files: Option<PathBuf>,
    /// 2017 editions to look for.
    pub skus: Option<Vec<String>>,
    /// Root of the per-user extension data.
    pub settings_root: Option<PathBuf>,
    pub installations: Vec<DeclaredInstallation>,
}

impl ToolConfig {
    /// Load from an explicit file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Locate and load the configuration, or fall back to defaults.
    ///
    /// An explicit `VSIXUTIL_CONFIG` must exist; the per-user file is optional.
    pub fn discover() -> Result<Self> {
        if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
            let path = PathBuf::from(explicit);
            tracing::debug!(path = %path.display(), "Loading config from {}", CONFIG_ENV);
            return Self::load(&path);
        }

        match dirs::config_dir().map(|dir| dir.join("vsixutil").join("config.toml")) {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "Loading user config");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Program Files root, from config or the environment.
    pub fn program_files(&self) -> Option<PathBuf> {
        self.program_files.clone().or_else(|| {
            std::env::var_os("ProgramFiles(x86)")
                .or_else(|| std::env::var_os("ProgramFiles"))
                .map(PathBuf::from)
        })
    }

    pub fn skus(&self) -> Vec<String> {
        match &self.skus {
            Some(skus) => skus.clone(),
            None => DEFAULT_SKUS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Root of per-user extension data.
    ///
    /// Defaults to `Microsoft/VisualStudio` under the local data directory.
    pub fn settings_root(&self) -> PathBuf {
        self.settings_root.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("Microsoft")
                .join("VisualStudio")
        })
    }
}

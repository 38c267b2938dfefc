//! Per-version facts about the vendor extension manager.
//!
//! Each host version ships its own settings and implementation modules. The
//! table here is selected with an exhaustive match, so adding a version is a
//! compile error until its adapter exists.

use vsix_core::identity::{ModuleIdentity, ModuleVersion};
use vsix_core::redirect::EXTENSION_MANAGER_MODULE;
use vsix_core::HostVersion;

pub const SETTINGS_MODULE: &str = "Microsoft.VisualStudio.Settings";
pub const IMPLEMENTATION_MODULE: &str = "Microsoft.VisualStudio.ExtensionManager.Implementation";

/// The interface version the tool's calling convention is written against.
pub const INTERFACE_VERSION: ModuleVersion = ModuleVersion::new(10, 0, 0, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionAdapter {
    pub version: HostVersion,
    /// Appended to [`SETTINGS_MODULE`], e.g. `.14.0`.
    pub settings_suffix: &'static str,
    /// Whether the implementation also accepts older interface versions.
    pub forward_compatible: bool,
    /// Whether the package header exposes a writable `AllUsers` flag.
    pub header_writable: bool,
}

impl VersionAdapter {
    pub fn for_version(version: HostVersion) -> Self {
        let (settings_suffix, forward_compatible, header_writable) = match version {
            HostVersion::Vs2010 => ("", false, false),
            HostVersion::Vs2012 => (".11.0", false, true),
            HostVersion::Vs2013 => (".12.0", false, true),
            HostVersion::Vs2015 => (".14.0", false, true),
            HostVersion::Vs2017 => (".15.0", true, true),
        };
        Self {
            version,
            settings_suffix,
            forward_compatible,
            header_writable,
        }
    }

    pub fn settings_module(&self) -> ModuleIdentity {
        ModuleIdentity::vendor(
            format!("{}{}", SETTINGS_MODULE, self.settings_suffix),
            ModuleVersion::of_host(self.version),
        )
    }

    pub fn implementation_module(&self) -> ModuleIdentity {
        ModuleIdentity::vendor(IMPLEMENTATION_MODULE, ModuleVersion::of_host(self.version))
    }

    /// The interface identity as the tool requests it, before any redirect.
    pub fn interface_module() -> ModuleIdentity {
        ModuleIdentity::vendor(EXTENSION_MANAGER_MODULE, INTERFACE_VERSION)
    }

    /// Whether this version's implementation can be constructed against the
    /// interface at `effective` version.
    pub fn accepts_interface(&self, effective: ModuleVersion) -> bool {
        let own = ModuleVersion::of_host(self.version);
        effective == own || (self.forward_compatible && effective < own)
    }
}

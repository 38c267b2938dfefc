//! Binding redirects for the vendor extension-manager interface module.
//!
//! The tool is built against the oldest interface version. For every newer
//! host the isolated boundary is handed a small configuration descriptor that
//! remaps `10.0.0.0-N.0.0.0` to `N.0.0.0`, so the same calling convention
//! binds against every implementation.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::identity::{ModuleIdentity, ModuleVersion, VENDOR_PUBLIC_KEY_TOKEN};
use crate::version::HostVersion;

/// Simple name of the vendor extension-manager interface module.
pub const EXTENSION_MANAGER_MODULE: &str = "Microsoft.VisualStudio.ExtensionManager";

static IDENTITY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<assemblyIdentity\s[^>]*?\bname="([^"]+)""#).unwrap());
static IDENTITY_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<assemblyIdentity\s[^>]*?\bpublicKeyToken="([^"]+)""#).unwrap());
static OLD_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<bindingRedirect\s[^>]*?\boldVersion="([^"]+)""#).unwrap());
static NEW_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<bindingRedirect\s[^>]*?\bnewVersion="([^"]+)""#).unwrap());

/// A single `oldVersion` range to `newVersion` remap for one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingRedirect {
    module: String,
    public_key_token: String,
    old_low: ModuleVersion,
    old_high: ModuleVersion,
    new_version: ModuleVersion,
}

impl BindingRedirect {
    /// The redirect an isolated boundary needs for `version`.
    ///
    /// Returns `None` for the oldest version, whose implementation already
    /// matches the interface the tool is built against.
    pub fn for_version(version: HostVersion) -> Option<Self> {
        if version.is_oldest() {
            return None;
        }

        let target = ModuleVersion::of_host(version);
        Some(Self {
            module: EXTENSION_MANAGER_MODULE.to_string(),
            public_key_token: VENDOR_PUBLIC_KEY_TOKEN.to_string(),
            old_low: ModuleVersion::of_host(HostVersion::OLDEST),
            old_high: target,
            new_version: target,
        })
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// The `oldVersion` attribute value, e.g. `10.0.0.0-15.0.0.0`.
    pub fn old_version_range(&self) -> String {
        format!("{}-{}", self.old_low, self.old_high)
    }

    pub fn new_version(&self) -> ModuleVersion {
        self.new_version
    }

    /// Whether `identity` names this module at a version inside the old range.
    pub fn applies_to(&self, identity: &ModuleIdentity) -> bool {
        if !identity.name.eq_ignore_ascii_case(&self.module) {
            return false;
        }
        if let Some(token) = &identity.public_key_token {
            if !token.eq_ignore_ascii_case(&self.public_key_token) {
                return false;
            }
        }
        match identity.version {
            Some(version) => version >= self.old_low && version <= self.old_high,
            None => true,
        }
    }

    /// Remap `identity` when the redirect applies, otherwise return it unchanged.
    pub fn apply(&self, identity: &ModuleIdentity) -> ModuleIdentity {
        if self.applies_to(identity) {
            identity.with_version(self.new_version)
        } else {
            identity.clone()
        }
    }

    /// Render the configuration descriptor.
    pub fn to_xml(&self) -> String {
        format!(
            r#"
<configuration>
  <runtime>
    <assemblyBinding xmlns="urn:schemas-microsoft-com:asm.v1">
      <dependentAssembly>
        <assemblyIdentity name="{module}" publicKeyToken="{token}" culture="neutral" />
        <bindingRedirect oldVersion="{old}" newVersion="{new}" />
      </dependentAssembly>
    </assemblyBinding>
  </runtime>
</configuration>
"#,
            module = self.module,
            token = self.public_key_token,
            old = self.old_version_range(),
            new = self.new_version,
        )
    }

    /// Parse a configuration descriptor produced by [`to_xml`](Self::to_xml).
    pub fn from_xml(path: &Path, content: &str) -> Result<Self> {
        let malformed = |message: &str| Error::MalformedRedirect {
            path: path.to_path_buf(),
            message: message.to_string(),
        };
        let capture = |regex: &Regex, what: &str| -> Result<String> {
            regex
                .captures(content)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .ok_or_else(|| malformed(&format!("missing {}", what)))
        };

        let module = capture(&IDENTITY_NAME, "assemblyIdentity name")?;
        let public_key_token = capture(&IDENTITY_TOKEN, "assemblyIdentity publicKeyToken")?;
        let old_range = capture(&OLD_VERSION, "bindingRedirect oldVersion")?;
        let new_version = capture(&NEW_VERSION, "bindingRedirect newVersion")?;

        let (low, high) = old_range
            .split_once('-')
            .ok_or_else(|| malformed("oldVersion must be a range"))?;

        Ok(Self {
            module,
            public_key_token,
            old_low: low.parse()?,
            old_high: high.parse()?,
            new_version: new_version.parse()?,
        })
    }

    /// Read a descriptor from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_xml(path, &content)
    }

    /// Write the descriptor to a new temporary file and keep it.
    ///
    /// The file is not removed afterwards: the boundary reads it lazily and
    /// may do so after the creating call returns. One small file per isolated
    /// version per run is left in the temp directory.
    pub fn write_temporary(&self) -> Result<PathBuf> {
        let temp_dir = std::env::temp_dir();
        let mut file = tempfile::Builder::new()
            .prefix("vsixutil-")
            .suffix(".config")
            .tempfile()
            .map_err(|e| Error::io(&temp_dir, e))?;

        file.write_all(self.to_xml().as_bytes())
            .map_err(|e| Error::io(file.path(), e))?;

        let (_, path) = file.keep().map_err(|e| Error::io(&temp_dir, e.error))?;
        tracing::debug!(path = %path.display(), range = %self.old_version_range(), "Wrote binding redirect");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_oldest_version_has_no_redirect() {
        assert!(BindingRedirect::for_version(HostVersion::Vs2010).is_none());
    }

    #[rstest]
    #[case(HostVersion::Vs2012, "10.0.0.0-11.0.0.0", "11.0.0.0")]
    #[case(HostVersion::Vs2013, "10.0.0.0-12.0.0.0", "12.0.0.0")]
    #[case(HostVersion::Vs2015, "10.0.0.0-14.0.0.0", "14.0.0.0")]
    #[case(HostVersion::Vs2017, "10.0.0.0-15.0.0.0", "15.0.0.0")]
    fn test_redirect_range(
        #[case] version: HostVersion,
        #[case] range: &str,
        #[case] new_version: &str,
    ) {
        let redirect = BindingRedirect::for_version(version).unwrap();
        assert_eq!(redirect.old_version_range(), range);
        assert_eq!(redirect.new_version().to_string(), new_version);

        let xml = redirect.to_xml();
        assert!(xml.contains(&format!(r#"oldVersion="{}""#, range)));
        assert!(xml.contains(&format!(r#"newVersion="{}""#, new_version)));
        assert!(xml.contains(r#"name="Microsoft.VisualStudio.ExtensionManager""#));
        assert!(xml.contains(r#"publicKeyToken="b03f5f7f11d50a3a""#));
    }

    #[test]
    fn test_xml_parses_back() {
        let redirect = BindingRedirect::for_version(HostVersion::Vs2015).unwrap();
        let parsed = BindingRedirect::from_xml(Path::new("app.config"), &redirect.to_xml()).unwrap();
        assert_eq!(parsed, redirect);
    }

    #[test]
    fn test_from_xml_rejects_missing_redirect() {
        let xml = r#"<configuration><runtime><assemblyBinding>
            <dependentAssembly>
              <assemblyIdentity name="X" publicKeyToken="abc" culture="neutral" />
            </dependentAssembly></assemblyBinding></runtime></configuration>"#;
        let err = BindingRedirect::from_xml(Path::new("bad.config"), xml).unwrap_err();
        assert!(matches!(err, Error::MalformedRedirect { .. }));
    }

    #[test]
    fn test_apply_remaps_only_inside_range() {
        let redirect = BindingRedirect::for_version(HostVersion::Vs2013).unwrap();
        let interface = ModuleIdentity::vendor(EXTENSION_MANAGER_MODULE, ModuleVersion::new(10, 0, 0, 0));
        assert_eq!(
            redirect.apply(&interface).version,
            Some(ModuleVersion::new(12, 0, 0, 0))
        );

        let newer = interface.with_version(ModuleVersion::new(14, 0, 0, 0));
        assert_eq!(redirect.apply(&newer), newer);

        let other = ModuleIdentity::vendor("Something.Else", ModuleVersion::new(10, 0, 0, 0));
        assert_eq!(redirect.apply(&other), other);
    }

    #[test]
    fn test_apply_respects_public_key_token() {
        let redirect = BindingRedirect::for_version(HostVersion::Vs2013).unwrap();
        let mut foreign = ModuleIdentity::vendor(EXTENSION_MANAGER_MODULE, ModuleVersion::new(10, 0, 0, 0));
        foreign.public_key_token = Some("0000000000000000".to_string());
        assert!(!redirect.applies_to(&foreign));
    }

    #[test]
    fn test_write_temporary_keeps_file() {
        let redirect = BindingRedirect::for_version(HostVersion::Vs2017).unwrap();
        let path = redirect.write_temporary().unwrap();

        assert!(path.is_file());
        assert_eq!(BindingRedirect::load(&path).unwrap(), redirect);

        fs::remove_file(path).unwrap();
    }
}

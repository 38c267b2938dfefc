//! Strong module identities, e.g.
//! `Microsoft.VisualStudio.Settings.15.0, Version=15.0.0.0, Culture=neutral, PublicKeyToken=b03f5f7f11d50a3a`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::version::HostVersion;

/// Public key token shared by every vendor module.
pub const VENDOR_PUBLIC_KEY_TOKEN: &str = "b03f5f7f11d50a3a";

/// Four-part module version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleVersion {
    pub major: u16,
    pub minor: u16,
    pub build: u16,
    pub revision: u16,
}

impl ModuleVersion {
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }

    /// `{major}.0.0.0` for a host version.
    pub fn of_host(version: HostVersion) -> Self {
        Self::new(version.major() as u16, 0, 0, 0)
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

impl FromStr for ModuleVersion {
    type Err = Error;

    /// Parses one to four dot-separated parts; missing parts are zero.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = |message: &str| Error::InvalidIdentity {
            identity: s.to_string(),
            message: message.to_string(),
        };

        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.is_empty() || parts.len() > 4 {
            return Err(invalid("expected one to four version parts"));
        }

        let mut numbers = [0u16; 4];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| invalid("version parts must be numeric"))?;
        }

        Ok(Self::new(numbers[0], numbers[1], numbers[2], numbers[3]))
    }
}

/// A strong module identity: simple name plus version, culture and key token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleIdentity {
    pub name: String,
    pub version: Option<ModuleVersion>,
    pub culture: Option<String>,
    pub public_key_token: Option<String>,
}

impl ModuleIdentity {
    /// A vendor module identity (neutral culture, vendor key token).
    pub fn vendor(name: impl Into<String>, version: ModuleVersion) -> Self {
        Self {
            name: name.into(),
            version: Some(version),
            culture: Some("neutral".to_string()),
            public_key_token: Some(VENDOR_PUBLIC_KEY_TOKEN.to_string()),
        }
    }

    /// Same identity with a different version.
    pub fn with_version(&self, version: ModuleVersion) -> Self {
        Self {
            version: Some(version),
            ..self.clone()
        }
    }

    /// Strip an identity string down to its simple name.
    pub fn simple_name(identity: &str) -> &str {
        identity.split(',').next().unwrap_or(identity).trim()
    }
}

impl FromStr for ModuleIdentity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split(',').map(str::trim);
        let name = parts.next().unwrap_or_default();
        if name.is_empty() {
            return Err(Error::InvalidIdentity {
                identity: s.to_string(),
                message: "missing module name".to_string(),
            });
        }

        let mut identity = Self {
            name: name.to_string(),
            version: None,
            culture: None,
            public_key_token: None,
        };

        for part in parts {
            let Some((key, value)) = part.split_once('=') else {
                return Err(Error::InvalidIdentity {
                    identity: s.to_string(),
                    message: format!("expected key=value, found '{}'", part),
                });
            };
            match key.trim().to_ascii_lowercase().as_str() {
                "version" => identity.version = Some(value.trim().parse()?),
                "culture" => identity.culture = Some(value.trim().to_string()),
                "publickeytoken" => identity.public_key_token = Some(value.trim().to_string()),
                other => {
                    tracing::debug!(key = other, "Ignoring unknown identity attribute");
                }
            }
        }

        Ok(identity)
    }
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(version) = &self.version {
            write!(f, ", Version={}", version)?;
        }
        if let Some(culture) = &self.culture {
            write!(f, ", Culture={}", culture)?;
        }
        if let Some(token) = &self.public_key_token {
            write!(f, ", PublicKeyToken={}", token)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_strong_name() {
        let identity: ModuleIdentity = "Microsoft.VisualStudio.Settings.15.0, Version=15.0.0.0, Culture=neutral, PublicKeyToken=b03f5f7f11d50a3a"
            .parse()
            .unwrap();

        assert_eq!(identity.name, "Microsoft.VisualStudio.Settings.15.0");
        assert_eq!(identity.version, Some(ModuleVersion::new(15, 0, 0, 0)));
        assert_eq!(identity.culture.as_deref(), Some("neutral"));
        assert_eq!(identity.public_key_token.as_deref(), Some(VENDOR_PUBLIC_KEY_TOKEN));
    }

    #[test]
    fn test_display_roundtrips_vendor_identity() {
        let identity = ModuleIdentity::vendor(
            "Microsoft.VisualStudio.ExtensionManager",
            ModuleVersion::new(12, 0, 0, 0),
        );
        assert_eq!(
            identity.to_string(),
            "Microsoft.VisualStudio.ExtensionManager, Version=12.0.0.0, Culture=neutral, PublicKeyToken=b03f5f7f11d50a3a"
        );
        assert_eq!(identity.to_string().parse::<ModuleIdentity>().unwrap(), identity);
    }

    #[test]
    fn test_simple_name() {
        assert_eq!(ModuleIdentity::simple_name("Foo.Bar, Version=1.0.0.0"), "Foo.Bar");
        assert_eq!(ModuleIdentity::simple_name("Foo.Bar"), "Foo.Bar");
    }

    #[test]
    fn test_version_parse_pads_missing_parts() {
        assert_eq!("14".parse::<ModuleVersion>().unwrap(), ModuleVersion::new(14, 0, 0, 0));
        assert_eq!("14.1".parse::<ModuleVersion>().unwrap(), ModuleVersion::new(14, 1, 0, 0));
        assert!("14.x".parse::<ModuleVersion>().is_err());
        assert!("1.2.3.4.5".parse::<ModuleVersion>().is_err());
    }

    #[test]
    fn test_version_ordering() {
        let low = ModuleVersion::new(10, 0, 0, 0);
        let high = ModuleVersion::new(15, 0, 0, 0);
        assert!(low < high);
        assert!(ModuleVersion::new(10, 0, 0, 1) > low);
    }

    #[test]
    fn test_parse_rejects_garbage_attribute() {
        assert!("Foo, Version".parse::<ModuleIdentity>().is_err());
        assert!(", Version=1.0".parse::<ModuleIdentity>().is_err());
    }
}

//! Host versions and discovered installations.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A supported major release of the host IDE.
///
/// Variants are declared oldest first so the derived ordering follows
/// release order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HostVersion {
    Vs2010,
    Vs2012,
    Vs2013,
    Vs2015,
    Vs2017,
}

impl HostVersion {
    /// Every supported version in release order.
    pub const ALL: [HostVersion; 5] = [
        HostVersion::Vs2010,
        HostVersion::Vs2012,
        HostVersion::Vs2013,
        HostVersion::Vs2015,
        HostVersion::Vs2017,
    ];

    /// The oldest supported version. Its extension manager needs no redirect.
    pub const OLDEST: HostVersion = HostVersion::Vs2010;

    /// The newest supported version.
    pub const NEWEST: HostVersion = HostVersion::Vs2017;

    /// Internal major version number (`10`, `11`, ...).
    pub fn major(self) -> u32 {
        match self {
            Self::Vs2010 => 10,
            Self::Vs2012 => 11,
            Self::Vs2013 => 12,
            Self::Vs2015 => 14,
            Self::Vs2017 => 15,
        }
    }

    /// Marketing year of the release.
    pub fn year(self) -> u32 {
        match self {
            Self::Vs2010 => 2010,
            Self::Vs2012 => 2012,
            Self::Vs2013 => 2013,
            Self::Vs2015 => 2015,
            Self::Vs2017 => 2017,
        }
    }

    /// Look up a version by major number or release year.
    pub fn from_number(number: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.major() == number || v.year() == number)
            .ok_or_else(|| Error::UnsupportedVersion(number.to_string()))
    }

    /// Returns true when `tag` is exactly this version's major number or year.
    pub fn matches_tag(self, tag: &str) -> bool {
        let tag = tag.trim();
        tag == self.major().to_string() || tag == self.year().to_string()
    }

    /// Four-part assembly version of the vendor modules, e.g. `15.0.0.0`.
    pub fn assembly_version(self) -> String {
        format!("{}.0.0.0", self.major())
    }

    pub fn is_oldest(self) -> bool {
        self == Self::OLDEST
    }

    pub fn is_newest(self) -> bool {
        self == Self::NEWEST
    }
}

impl fmt::Display for HostVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vs{}", self.year())
    }
}

impl FromStr for HostVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("Vs")
            .or_else(|| trimmed.strip_prefix("vs"))
            .unwrap_or(trimmed);
        // Accept "15.0" as well as "15"
        let major = digits.split('.').next().unwrap_or(digits);
        major
            .parse::<u32>()
            .map_err(|_| Error::UnsupportedVersion(s.to_string()))
            .and_then(Self::from_number)
    }
}

/// One discovered installation of the host IDE.
///
/// Immutable once discovered; compared by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstalledVersion {
    application_path: PathBuf,
    version: HostVersion,
    product: Option<String>,
}

impl InstalledVersion {
    pub fn new(application_path: impl Into<PathBuf>, version: HostVersion) -> Self {
        Self {
            application_path: application_path.into(),
            version,
            product: None,
        }
    }

    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }

    /// Path to the application executable (e.g. `.../Common7/IDE/devenv.exe`).
    pub fn application_path(&self) -> &Path {
        &self.application_path
    }

    pub fn version(&self) -> HostVersion {
        self.version
    }

    pub fn product(&self) -> Option<&str> {
        self.product.as_deref()
    }

    /// Directory holding the application executable.
    ///
    /// Module probing is rooted here.
    pub fn application_dir(&self) -> PathBuf {
        match self.application_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Match against a `/product` filter.
    ///
    /// True when the product label starts with `filter` or the application
    /// path contains it, both compared case-insensitively.
    pub fn matches_product(&self, filter: &str) -> bool {
        let needle = filter.to_lowercase();
        let label_match = self
            .product
            .as_deref()
            .is_some_and(|p| p.to_lowercase().starts_with(&needle));
        label_match
            || self
                .application_path
                .to_string_lossy()
                .to_lowercase()
                .contains(&needle)
    }
}

impl fmt::Display for InstalledVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.product {
            Some(product) => write!(f, "{} {}", self.version, product),
            None => write!(f, "{}", self.version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(10, HostVersion::Vs2010)]
    #[case(2010, HostVersion::Vs2010)]
    #[case(11, HostVersion::Vs2012)]
    #[case(12, HostVersion::Vs2013)]
    #[case(2013, HostVersion::Vs2013)]
    #[case(14, HostVersion::Vs2015)]
    #[case(15, HostVersion::Vs2017)]
    #[case(2017, HostVersion::Vs2017)]
    fn test_from_number(#[case] number: u32, #[case] expected: HostVersion) {
        assert_eq!(HostVersion::from_number(number).unwrap(), expected);
    }

    #[rstest]
    #[case(13)]
    #[case(16)]
    #[case(2019)]
    #[case(0)]
    fn test_from_number_unsupported(#[case] number: u32) {
        let err = HostVersion::from_number(number).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion(_)));
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!("15".parse::<HostVersion>().unwrap(), HostVersion::Vs2017);
        assert_eq!("15.0".parse::<HostVersion>().unwrap(), HostVersion::Vs2017);
        assert_eq!("Vs2012".parse::<HostVersion>().unwrap(), HostVersion::Vs2012);
        assert!("latest".parse::<HostVersion>().is_err());
    }

    #[test]
    fn test_matches_tag_is_exact() {
        assert!(HostVersion::Vs2015.matches_tag("14"));
        assert!(HostVersion::Vs2015.matches_tag("2015"));
        assert!(!HostVersion::Vs2015.matches_tag("1"));
        assert!(!HostVersion::Vs2015.matches_tag("14.0"));
    }

    #[test]
    fn test_ordering_follows_release() {
        assert!(HostVersion::Vs2010 < HostVersion::Vs2017);
        assert!(HostVersion::OLDEST.is_oldest());
        assert!(HostVersion::NEWEST.is_newest());
        assert_eq!(HostVersion::Vs2013.assembly_version(), "12.0.0.0");
    }

    #[test]
    fn test_display() {
        assert_eq!(HostVersion::Vs2013.to_string(), "Vs2013");
        let installed = InstalledVersion::new("/vs/devenv.exe", HostVersion::Vs2017)
            .with_product("Community");
        assert_eq!(installed.to_string(), "Vs2017 Community");
    }

    #[test]
    fn test_application_dir() {
        let installed = InstalledVersion::new("/vs/Common7/IDE/devenv.exe", HostVersion::Vs2015);
        assert_eq!(installed.application_dir(), PathBuf::from("/vs/Common7/IDE"));

        let bare = InstalledVersion::new("devenv.exe", HostVersion::Vs2015);
        assert_eq!(bare.application_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_matches_product_prefix_and_path() {
        let installed = InstalledVersion::new(
            "C:/Program Files (x86)/Microsoft Visual Studio/2017/Enterprise/Common7/IDE/devenv.exe",
            HostVersion::Vs2017,
        )
        .with_product("Enterprise");

        assert!(installed.matches_product("ent"));
        assert!(installed.matches_product("ENTERPRISE"));
        assert!(installed.matches_product("visual studio/2017"));
        assert!(!installed.matches_product("Community"));
        // "prise" is not a prefix of the label but is part of the path
        assert!(installed.matches_product("prise"));
    }

    #[test]
    fn test_matches_product_without_label() {
        let installed = InstalledVersion::new("/opt/vs10/devenv.exe", HostVersion::Vs2010);
        assert!(installed.matches_product("vs10"));
        assert!(!installed.matches_product("Community"));
    }
}

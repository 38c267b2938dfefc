//! Extension package reading.
//!
//! A package is a zip archive with an `extension.vsixmanifest` at its root.
//! Two manifest schemas exist in the wild:
//!
//! - 2010 (`<Vsix>`): `<Identifier Id>`, `<Name>`, `<Version>`, `<AllUsers>`
//! - 2011 (`<PackageManifest>`): `<Identity Id Version>`, `<DisplayName>`,
//!   `<Installation AllUsers>`

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::manager::ExtensionHeader;

pub const MANIFEST_FILENAME: &str = "extension.vsixmanifest";

static V1_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<Identifier\s[^>]*?\bId="([^"]*)""#).unwrap());
static V1_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Name>([^<]*)</Name>").unwrap());
static V1_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Version>([^<]*)</Version>").unwrap());
static V1_ALL_USERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<AllUsers>\s*(true|false)\s*</AllUsers>").unwrap());

static V2_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<Identity\s[^>]*?\bId="([^"]*)""#).unwrap());
static V2_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<Identity\s[^>]*?\bVersion="([^"]*)""#).unwrap());
static V2_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<DisplayName>([^<]*)</DisplayName>").unwrap());
static V2_ALL_USERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<Installation\s[^>]*?\bAllUsers="(true|false)""#).unwrap());

/// Read the manifest header of the package at `path`.
pub fn read_header(path: &Path) -> Result<ExtensionHeader> {
    let manifest = read_manifest(path)?;
    parse_manifest(path, &manifest)
}

fn open_archive(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    ZipArchive::new(file).map_err(|source| Error::Archive {
        path: path.to_path_buf(),
        source,
    })
}

fn read_manifest(path: &Path) -> Result<String> {
    let mut archive = open_archive(path)?;
    let mut entry = archive.by_name(MANIFEST_FILENAME).map_err(|_| Error::InvalidPackage {
        path: path.to_path_buf(),
        reason: format!("missing {}", MANIFEST_FILENAME),
    })?;

    let mut manifest = String::new();
    entry
        .read_to_string(&mut manifest)
        .map_err(|e| Error::io(path, e))?;
    Ok(manifest)
}

/// Parse manifest text in either schema.
pub fn parse_manifest(path: &Path, manifest: &str) -> Result<ExtensionHeader> {
    let invalid = |reason: &str| Error::InvalidPackage {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let (identifier, name, version, all_users) = if manifest.contains("<PackageManifest") {
        (
            capture(&V2_IDENTIFIER, manifest),
            capture(&V2_NAME, manifest),
            capture(&V2_VERSION, manifest),
            capture(&V2_ALL_USERS, manifest),
        )
    } else if manifest.contains("<Vsix") {
        (
            capture(&V1_IDENTIFIER, manifest),
            capture(&V1_NAME, manifest),
            capture(&V1_VERSION, manifest),
            capture(&V1_ALL_USERS, manifest),
        )
    } else {
        return Err(invalid("unrecognised manifest schema"));
    };

    let identifier = identifier
        .map(|id| unescape(id.trim()))
        .filter(|id| !id.is_empty())
        .ok_or_else(|| invalid("manifest has no identifier"))?;

    Ok(ExtensionHeader {
        name: name.map(|n| unescape(n.trim())).unwrap_or_else(|| identifier.clone()),
        version: version.map(|v| v.trim().to_string()).unwrap_or_default(),
        all_users: all_users.is_some_and(|v| v.eq_ignore_ascii_case("true")),
        identifier,
    })
}

fn capture<'a>(regex: &Regex, text: &'a str) -> Option<&'a str> {
    regex.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Extract every entry of the package into `dest`.
///
/// Entries whose names would escape `dest` are skipped.
pub fn extract(path: &Path, dest: &Path) -> Result<()> {
    let mut archive = open_archive(path)?;
    fs::create_dir_all(dest).map_err(|e| Error::io(dest, e))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|source| Error::Archive {
            path: path.to_path_buf(),
            source,
        })?;

        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!(entry = entry.name(), "Skipping archive entry outside the package");
            continue;
        };
        let out: PathBuf = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out).map_err(|e| Error::io(&out, e))?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let mut file = File::create(&out).map_err(|e| Error::io(&out, e))?;
        io::copy(&mut entry, &mut file).map_err(|e| Error::io(&out, e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use vsix_test_utils::{ManifestSchema, VsixBuilder};

    #[test]
    fn test_read_v2_header() {
        let temp = TempDir::new().unwrap();
        let path = VsixBuilder::new("Acme.Tools")
            .name("Acme Tools")
            .version("2.1")
            .all_users(true)
            .write(temp.path(), "acme.vsix");

        let header = read_header(&path).unwrap();
        assert_eq!(
            header,
            ExtensionHeader {
                identifier: "Acme.Tools".to_string(),
                name: "Acme Tools".to_string(),
                version: "2.1".to_string(),
                all_users: true,
            }
        );
    }

    #[test]
    fn test_read_v1_header() {
        let temp = TempDir::new().unwrap();
        let path = VsixBuilder::new("legacy.ext")
            .name("Legacy &amp; Friends")
            .schema(ManifestSchema::V1)
            .write(temp.path(), "legacy.vsix");

        let header = read_header(&path).unwrap();
        assert_eq!(header.identifier, "legacy.ext");
        assert_eq!(header.name, "Legacy & Friends");
        assert_eq!(header.version, "1.0");
        assert!(!header.all_users);
    }

    #[test]
    fn test_manifest_without_identifier_is_invalid() {
        let manifest = "<PackageManifest><Metadata><DisplayName>x</DisplayName></Metadata></PackageManifest>";
        let err = parse_manifest(Path::new("x.vsix"), manifest).unwrap_err();
        assert!(matches!(err, Error::InvalidPackage { .. }));
    }

    #[test]
    fn test_unknown_schema_is_invalid() {
        let err = parse_manifest(Path::new("x.vsix"), "<Other />").unwrap_err();
        assert!(matches!(err, Error::InvalidPackage { .. }));
    }

    #[test]
    fn test_non_zip_is_archive_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.vsix");
        fs::write(&path, b"not a zip").unwrap();

        assert!(matches!(read_header(&path).unwrap_err(), Error::Archive { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = read_header(&temp.path().join("nope.vsix")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_extract_writes_payload() {
        let temp = TempDir::new().unwrap();
        let path = VsixBuilder::new("payload")
            .file("bin/Payload.dll", b"payload")
            .write(temp.path(), "payload.vsix");

        let dest = temp.path().join("out");
        extract(&path, &dest).unwrap();

        assert!(dest.join(MANIFEST_FILENAME).is_file());
        assert_eq!(fs::read(dest.join("bin/Payload.dll")).unwrap(), b"payload");
    }
}

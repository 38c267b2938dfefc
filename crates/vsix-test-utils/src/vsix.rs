//! [`VsixBuilder`] for extension package fixtures.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Which manifest schema to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestSchema {
    /// 2010 schema: `<Vsix>` with an `<Identifier>` block.
    V1,
    /// 2011 schema: `<PackageManifest>` with `<Metadata>/<Identity>`.
    V2,
}

pub struct VsixBuilder {
    identifier: String,
    name: String,
    version: String,
    all_users: bool,
    schema: ManifestSchema,
    files: Vec<(String, Vec<u8>)>,
}

impl VsixBuilder {
    pub fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            name: identifier.to_string(),
            version: "1.0".to_string(),
            all_users: false,
            schema: ManifestSchema::V2,
            files: Vec::new(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn all_users(mut self, all_users: bool) -> Self {
        self.all_users = all_users;
        self
    }

    pub fn schema(mut self, schema: ManifestSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Add a payload file at `name` inside the archive.
    pub fn file(mut self, name: &str, content: &[u8]) -> Self {
        self.files.push((name.to_string(), content.to_vec()));
        self
    }

    pub fn manifest(&self) -> String {
        match self.schema {
            ManifestSchema::V1 => format!(
                r#"<?xml version="1.0" encoding="utf-8"?>
<Vsix Version="1.0.0" xmlns="http://schemas.microsoft.com/developer/vsx-schema/2010">
  <Identifier Id="{id}">
    <Name>{name}</Name>
    <Author>Fixture</Author>
    <Version>{version}</Version>
    <AllUsers>{all_users}</AllUsers>
  </Identifier>
  <Content />
</Vsix>
"#,
                id = self.identifier,
                name = self.name,
                version = self.version,
                all_users = self.all_users,
            ),
            ManifestSchema::V2 => format!(
                r#"<?xml version="1.0" encoding="utf-8"?>
<PackageManifest Version="2.0.0" xmlns="http://schemas.microsoft.com/developer/vsx-schema/2011">
  <Metadata>
    <Identity Id="{id}" Version="{version}" Language="en-US" Publisher="Fixture" />
    <DisplayName>{name}</DisplayName>
  </Metadata>
  <Installation AllUsers="{all_users}">
    <InstallationTarget Id="Microsoft.VisualStudio.Community" Version="[14.0,16.0)" />
  </Installation>
  <Assets />
</PackageManifest>
"#,
                id = self.identifier,
                name = self.name,
                version = self.version,
                all_users = self.all_users,
            ),
        }
    }

    /// Write the package to `dir/{file_name}` and return its path.
    pub fn write(&self, dir: &Path, file_name: &str) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(file_name);
        let mut zip = ZipWriter::new(File::create(&path).unwrap());
        let options = SimpleFileOptions::default();

        zip.start_file("extension.vsixmanifest", options).unwrap();
        zip.write_all(self.manifest().as_bytes()).unwrap();

        for (name, content) in &self.files {
            zip.start_file(name.as_str(), options).unwrap();
            zip.write_all(content).unwrap();
        }

        zip.finish().unwrap();
        path
    }
}

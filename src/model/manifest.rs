//! Serde views of the metadata files a package may carry.

use anyhow::{Context, Result};
use serde::Deserialize;

use super::{DependencyRequirement, FileKind, ModInfo};
use crate::resolver::version::{VersionRange, parse_version_lenient};

/// `modinfo.json`: the full mod metadata manifest.
#[derive(Debug, Deserialize)]
pub struct ModManifest {
    #[serde(default)]
    pub kind: Option<ManifestKind>,
    #[serde(default)]
    pub mods: Vec<ModEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ModEntry {
    pub id: String,
    pub version: String,
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,
}

#[derive(Debug, Deserialize)]
pub struct DependencyEntry {
    pub id: String,
    pub range: VersionRange,
}

/// `libinfo.json`: marker manifest for entry-less library packages.
#[derive(Debug, Deserialize)]
pub struct LibraryManifest {
    #[serde(rename = "type")]
    pub kind: ManifestKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestKind {
    Mod,
    Library,
    GameLibrary,
}

impl From<ManifestKind> for FileKind {
    fn from(kind: ManifestKind) -> Self {
        match kind {
            ManifestKind::Mod => FileKind::Mod,
            ManifestKind::Library => FileKind::Library,
            ManifestKind::GameLibrary => FileKind::GameLibrary,
        }
    }
}

impl ModManifest {
    pub const FILE: &'static str = "modinfo.json";

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).context("Malformed modinfo.json")
    }

    pub fn file_kind(&self) -> FileKind {
        self.kind.map(FileKind::from).unwrap_or(FileKind::Mod)
    }

    pub fn mod_infos(&self) -> Result<Vec<ModInfo>> {
        self.mods
            .iter()
            .map(|entry| {
                let version = parse_version_lenient(&entry.version)
                    .with_context(|| format!("Mod `{}` declares a bad version", entry.id))?;
                Ok(ModInfo {
                    id: entry.id.clone(),
                    version,
                    dependencies: entry
                        .dependencies
                        .iter()
                        .map(|d| DependencyRequirement { id: d.id.clone(), range: d.range.clone() })
                        .collect(),
                })
            })
            .collect()
    }
}

impl LibraryManifest {
    pub const FILE: &'static str = "libinfo.json";

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).context("Malformed libinfo.json")
    }
}

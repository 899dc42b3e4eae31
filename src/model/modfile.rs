use semver::Version;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use super::{DiscoveryAttributes, ExtractionView, PackageContents};
use crate::resolver::version::VersionRange;
use crate::runtime::Runtime;

/// Which resource group a mod file belongs to in the final plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Carries mod entries and participates in dependency ordering.
    Mod,
    /// Plain code library, loaded ahead of mods.
    Library,
    /// Library that lives alongside game code rather than the plugin layer.
    GameLibrary,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Mod => write!(f, "mod"),
            FileKind::Library => write!(f, "library"),
            FileKind::GameLibrary => write!(f, "gamelibrary"),
        }
    }
}

/// A dependency declared by a mod entry on another mod id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRequirement {
    pub id: String,
    pub range: VersionRange,
}

/// One mod entry declared inside a mod file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModInfo {
    pub id: String,
    pub version: Version,
    pub dependencies: Vec<DependencyRequirement>,
}

/// Stable identity of a mod file, derived from canonical path identity and
/// never from declared ids or versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn for_contents(runtime: &dyn Runtime, contents: &PackageContents) -> Self {
        let mut parts: Vec<String> = contents
            .paths()
            .iter()
            .map(|p| {
                runtime
                    .canonicalize(p)
                    .unwrap_or_else(|_| lexical_clean(p))
                    .display()
                    .to_string()
            })
            .collect();
        parts.sort();
        IdentityKey(parts.join("|"))
    }

    /// Identity for synthetic system files that have no on-disk package.
    pub fn synthetic(name: &str) -> Self {
        IdentityKey(format!("builtin:{name}"))
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalize `.` and `..` components without touching the filesystem, for
/// paths that cannot be canonicalized (not yet existing, mock runtimes).
fn lexical_clean(path: &std::path::Path) -> PathBuf {
    use std::path::Component;
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !cleaned.pop() {
                    cleaned.push(Component::ParentDir);
                }
            }
            other => cleaned.push(other),
        }
    }
    cleaned
}

/// A classified, loadable package: contents plus metadata plus provenance.
#[derive(Debug, Clone)]
pub struct ModFile {
    pub contents: PackageContents,
    pub kind: FileKind,
    pub mods: Vec<ModInfo>,
    pub attributes: DiscoveryAttributes,
    identity: IdentityKey,
    valid: bool,
    /// Keeps the extracted storage of an embedded file alive.
    view: Option<Arc<ExtractionView>>,
}

impl ModFile {
    pub fn new(
        runtime: &dyn Runtime,
        contents: PackageContents,
        kind: FileKind,
        mods: Vec<ModInfo>,
        attributes: DiscoveryAttributes,
    ) -> Self {
        let identity = IdentityKey::for_contents(runtime, &contents);
        Self { contents, kind, mods, attributes, identity, valid: true, view: None }
    }

    /// A synthetic file supplied by the loading system itself.
    pub fn builtin(name: &str, kind: FileKind, mods: Vec<ModInfo>) -> Self {
        Self {
            contents: PackageContents::single(PathBuf::from(format!("builtin:{name}"))),
            kind,
            mods,
            attributes: DiscoveryAttributes::default().with_system(true),
            identity: IdentityKey::synthetic(name),
            valid: true,
            view: None,
        }
    }

    pub fn identity(&self) -> &IdentityKey {
        &self.identity
    }

    pub fn file_name(&self) -> String {
        self.contents.display_name()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    pub fn set_view(&mut self, view: Arc<ExtractionView>) {
        self.view = Some(view);
    }

    /// Lightweight self-consistency check: each declared entry needs an id,
    /// and no id may repeat within one file.
    pub fn identify_mods(&self) -> bool {
        if !self.valid {
            return false;
        }
        let mut seen = std::collections::HashSet::new();
        for info in &self.mods {
            if info.id.is_empty() || !seen.insert(info.id.as_str()) {
                return false;
            }
        }
        true
    }

    /// Names used when this file is cited in dependency diagnostics: the
    /// declared mod ids, or the file name when it declares none.
    pub fn display_id(&self) -> String {
        if self.mods.is_empty() {
            self.file_name()
        } else {
            self.mods.iter().map(|m| m.id.as_str()).collect::<Vec<_>>().join("+")
        }
    }

    pub fn merge_attributes(&mut self, other: &DiscoveryAttributes) {
        self.attributes = self.attributes.merge(other);
    }

    /// Equivalent classification results may be merged by deduplication;
    /// anything else sharing an identity is a collision.
    pub fn same_classification(&self, other: &ModFile) -> bool {
        self.kind == other.kind && self.mods == other.mods
    }
}

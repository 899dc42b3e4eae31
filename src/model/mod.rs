//! Core data model: candidates, package contents, mod files and their
//! discovery provenance.

mod attributes;
mod contents;
mod manifest;
mod modfile;

pub use attributes::DiscoveryAttributes;
pub use contents::{Candidate, ExtractionView, PackageContents};
pub use manifest::{LibraryManifest, ManifestKind, ModManifest};
pub use modfile::{DependencyRequirement, FileKind, IdentityKey, ModFile, ModInfo};

use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::archive;
use crate::runtime::Runtime;

/// The storage of one package: either zip archives, exploded directories, or
/// a mix of both (a package may span several source roots).
///
/// Resource lookups walk the roots in order; the first root that holds the
/// requested relative path wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageContents {
    paths: Vec<PathBuf>,
}

impl PackageContents {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        debug_assert!(!paths.is_empty(), "a package needs at least one path");
        Self { paths }
    }

    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self::new(vec![path.into()])
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// The path shown to users and used for diagnostics.
    pub fn primary_path(&self) -> &Path {
        &self.paths[0]
    }

    pub fn display_name(&self) -> String {
        self.primary_path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.primary_path().display().to_string())
    }

    fn root_is_archive(&self, runtime: &dyn Runtime, root: &Path) -> bool {
        !runtime.is_dir(root)
    }

    /// Side-effect-free resource read; `Ok(None)` when no root contains the
    /// relative path.
    pub fn read_file(&self, runtime: &dyn Runtime, relative: &str) -> Result<Option<Vec<u8>>> {
        for root in &self.paths {
            if self.root_is_archive(runtime, root) {
                if let Some(data) = archive::read_entry(runtime, root, relative)? {
                    return Ok(Some(data));
                }
            } else {
                let path = root.join(relative);
                if runtime.exists(&path) {
                    return Ok(Some(runtime.read(&path)?));
                }
            }
        }
        Ok(None)
    }

    pub fn contains_file(&self, runtime: &dyn Runtime, relative: &str) -> Result<bool> {
        for root in &self.paths {
            let found = if self.root_is_archive(runtime, root) {
                archive::contains_entry(runtime, root, relative)?
            } else {
                runtime.exists(&root.join(relative))
            };
            if found {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Copy an embedded archive entry out into `dest`. Only meaningful for
    /// archive-backed roots; directory roots are copied byte-for-byte.
    pub fn extract_file(&self, runtime: &dyn Runtime, relative: &str, dest: &Path) -> Result<()> {
        for root in &self.paths {
            if self.root_is_archive(runtime, root) {
                if archive::contains_entry(runtime, root, relative)? {
                    return archive::extract_entry(runtime, root, relative, dest);
                }
            } else {
                let path = root.join(relative);
                if runtime.exists(&path) {
                    let data = runtime.read(&path)?;
                    if let Some(parent) = dest.parent() {
                        runtime.create_dir_all(parent)?;
                    }
                    return runtime.write(dest, &data);
                }
            }
        }
        anyhow::bail!(
            "Resource {} not found in package {}",
            relative,
            self.primary_path().display()
        )
    }
}

/// An unclassified package found by a locator. Consumed exactly once by the
/// classifier chain.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub contents: PackageContents,
    pub logical_name: Option<String>,
}

impl Candidate {
    pub fn new(contents: PackageContents) -> Self {
        Self { contents, logical_name: None }
    }

    pub fn named(contents: PackageContents, name: impl Into<String>) -> Self {
        Self { contents, logical_name: Some(name.into()) }
    }
}

/// Scoped storage backing a mod file extracted out of a parent package.
///
/// The directory lives exactly as long as the last mod file referencing it;
/// dropping that reference removes the extracted data from disk.
#[derive(Debug)]
pub struct ExtractionView {
    dir: TempDir,
}

impl ExtractionView {
    pub fn create() -> Result<Self> {
        let dir = TempDir::with_prefix("modplan-embedded-")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

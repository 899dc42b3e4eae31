use anyhow::Result;
use std::path::PathBuf;

use super::{Locator, ScanContext};
use crate::model::{Candidate, PackageContents};

/// One exploded (unpackaged) mod: a logical name and the source roots that
/// together form its contents.
#[derive(Debug, Clone)]
pub struct ExplodedEntry {
    pub name: String,
    pub paths: Vec<PathBuf>,
}

impl ExplodedEntry {
    pub fn new(name: impl Into<String>, paths: Vec<PathBuf>) -> Self {
        Self { name: name.into(), paths }
    }
}

/// Reports configured exploded directories, one candidate per entry.
/// A single mod may span several roots (e.g. split resource/class outputs).
#[derive(Default)]
pub struct ExplodedDirLocator {
    entries: Vec<ExplodedEntry>,
}

impl ExplodedDirLocator {
    pub fn new(entries: Vec<ExplodedEntry>) -> Self {
        Self { entries }
    }
}

impl Locator for ExplodedDirLocator {
    fn name(&self) -> &str {
        "exploded directory"
    }

    fn scan(&self, _ctx: &ScanContext<'_>) -> Result<Vec<Candidate>> {
        Ok(self
            .entries
            .iter()
            .map(|entry| {
                Candidate::named(PackageContents::new(entry.paths.clone()), entry.name.clone())
            })
            .collect())
    }
}

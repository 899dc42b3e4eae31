use anyhow::Result;
use log::debug;

use super::{Locator, ScanContext};
use crate::model::{Candidate, PackageContents};

const SUFFIX: &str = ".zip";

/// Finds packaged mods (`*.zip`) directly inside one folder.
pub struct ModsFolderLocator {
    folder: std::path::PathBuf,
    name: String,
}

impl ModsFolderLocator {
    pub fn new(folder: impl Into<std::path::PathBuf>) -> Self {
        Self::named(folder, "mods folder")
    }

    pub fn named(folder: impl Into<std::path::PathBuf>, name: impl Into<String>) -> Self {
        Self { folder: folder.into(), name: name.into() }
    }
}

impl Locator for ModsFolderLocator {
    fn name(&self) -> &str {
        &self.name
    }

    #[tracing::instrument(skip(self, ctx), fields(folder = %self.folder.display()))]
    fn scan(&self, ctx: &ScanContext<'_>) -> Result<Vec<Candidate>> {
        debug!("Scanning mods dir {:?} for mods", self.folder);
        if !ctx.runtime.exists(&self.folder) {
            return Ok(Vec::new());
        }

        let mut paths: Vec<_> = ctx
            .runtime
            .read_dir(&self.folder)?
            .into_iter()
            .filter(|p| !ctx.is_excluded(p))
            .filter(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().to_lowercase().ends_with(SUFFIX))
                    .unwrap_or(false)
            })
            .collect();

        // Deterministic discovery order regardless of directory iteration.
        paths.sort_by_key(|p| p.file_name().map(|n| n.to_string_lossy().to_lowercase()));

        Ok(paths
            .into_iter()
            .map(|p| Candidate::new(PackageContents::single(p)))
            .collect())
    }
}

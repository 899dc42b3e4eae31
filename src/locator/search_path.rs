use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use super::{Locator, LocatorConfig, ScanContext};
use crate::model::{Candidate, PackageContents};

/// Reports a fixed, configured list of package files (classpath-style).
///
/// Only active for dev-style launch targets; outside of those the configured
/// entries are development artifacts that must not leak into a normal run.
pub struct SearchPathLocator {
    entries: Vec<PathBuf>,
    enabled: bool,
}

impl SearchPathLocator {
    pub fn new(entries: Vec<PathBuf>) -> Self {
        Self { entries, enabled: false }
    }
}

impl Locator for SearchPathLocator {
    fn name(&self) -> &str {
        "search path"
    }

    #[tracing::instrument(skip(self, ctx))]
    fn scan(&self, ctx: &ScanContext<'_>) -> Result<Vec<Candidate>> {
        if !self.enabled {
            return Ok(Vec::new());
        }

        let mut seen = std::collections::HashSet::new();
        let mut candidates = Vec::new();
        for path in &self.entries {
            if ctx.is_excluded(path) || !seen.insert(path.clone()) {
                continue;
            }
            if !ctx.runtime.exists(path) || ctx.runtime.is_dir(path) {
                debug!("Skipping search path entry {:?}", path);
                continue;
            }
            candidates.push(Candidate::new(PackageContents::single(path.clone())));
        }
        Ok(candidates)
    }

    fn configure(&mut self, config: &LocatorConfig) {
        self.enabled = config
            .launch_target
            .as_deref()
            .map(|t| t.contains("dev"))
            .unwrap_or(false);
    }
}

//! Discovery strategies: each locator scans one source for candidate
//! packages. Locators are independent, read-only over their source, and may
//! be scanned concurrently by the orchestrator.

mod exploded;
mod folder;
mod search_path;

use anyhow::Result;
use std::collections::HashSet;
use std::path::PathBuf;

pub use exploded::{ExplodedDirLocator, ExplodedEntry};
pub use folder::ModsFolderLocator;
pub use search_path::SearchPathLocator;

use crate::model::Candidate;
use crate::runtime::Runtime;

/// Options applied to every locator before scanning starts.
#[derive(Debug, Default, Clone)]
pub struct LocatorConfig {
    /// Launch target name; some locators only activate for dev-style targets.
    pub launch_target: Option<String>,
}

/// Shared, read-only context for one scan pass.
pub struct ScanContext<'a> {
    pub runtime: &'a dyn Runtime,
    /// Paths claimed elsewhere (e.g. by early instrumentation) that no
    /// locator may report again.
    pub excluded: &'a HashSet<PathBuf>,
}

impl<'a> ScanContext<'a> {
    pub fn is_excluded(&self, path: &std::path::Path) -> bool {
        self.excluded.contains(path)
    }
}

/// One way of finding candidate packages.
///
/// `scan` returns an empty list for "nothing found"; an `Err` means the
/// source itself is unreadable, which the orchestrator logs and treats as
/// zero candidates. A locator reports each candidate at most once per scan.
pub trait Locator: Send + Sync {
    fn name(&self) -> &str;

    fn scan(&self, ctx: &ScanContext<'_>) -> Result<Vec<Candidate>>;

    fn configure(&mut self, _config: &LocatorConfig) {}
}

/// Ordered, configuration-time list of locators.
#[derive(Default)]
pub struct LocatorSet {
    locators: Vec<Box<dyn Locator>>,
}

impl LocatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, locator: Box<dyn Locator>) {
        self.locators.push(locator);
    }

    pub fn configure_all(&mut self, config: &LocatorConfig) {
        for locator in &mut self.locators {
            locator.configure(config);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Locator> {
        self.locators.iter().map(|l| l.as_ref())
    }

    pub fn len(&self) -> usize {
        self.locators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }
}

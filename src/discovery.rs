//! The discovery orchestrator: scan, classify, deduplicate, resolve embedded
//! dependencies, deduplicate again, diagnose leftovers, validate.
//!
//! Every stage degrades instead of aborting. Problems land in one of three
//! accumulations (errors, warnings, the plan itself) so a single run reports
//! everything wrong with a mod set at once.

use log::{debug, warn};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::classifier::{Classification, ClassifierChain, ForeignSignatures};
use crate::locator::{Locator, LocatorConfig, LocatorSet, ScanContext};
use crate::model::{Candidate, DiscoveryAttributes, ModFile};
use crate::progress::ProgressSink;
use crate::report::{DiscoveryReport, Issue, LoadPlan};
use crate::resolver::NestedDependencyResolver;
use crate::runtime::Runtime;
use crate::unique::UniqueListBuilder;
use crate::validator::ModValidator;

pub struct ModDiscoverer {
    locators: LocatorSet,
    chain: ClassifierChain,
    signatures: ForeignSignatures,
    config: LocatorConfig,
    excluded: HashSet<PathBuf>,
    builtins: Vec<ModFile>,
    require_non_empty: bool,
}

impl Default for ModDiscoverer {
    fn default() -> Self {
        Self::new()
    }
}

impl ModDiscoverer {
    pub fn new() -> Self {
        Self {
            locators: LocatorSet::new(),
            chain: ClassifierChain::standard(),
            signatures: ForeignSignatures::default(),
            config: LocatorConfig::default(),
            excluded: HashSet::new(),
            builtins: Vec::new(),
            require_non_empty: false,
        }
    }

    pub fn with_locator(mut self, locator: Box<dyn Locator>) -> Self {
        self.locators.register(locator);
        self
    }

    pub fn with_classifier_chain(mut self, chain: ClassifierChain) -> Self {
        self.chain = chain;
        self
    }

    pub fn with_config(mut self, config: LocatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn exclude(mut self, path: PathBuf) -> Self {
        self.excluded.insert(path);
        self
    }

    pub fn with_builtin(mut self, file: ModFile) -> Self {
        self.builtins.push(file);
        self
    }

    pub fn require_non_empty(mut self, required: bool) -> Self {
        self.require_non_empty = required;
        self
    }

    /// Run discovery through validator stage one. The returned validator has
    /// stage one applied; callers run stage two once capability checks are
    /// known.
    #[tracing::instrument(skip_all)]
    pub fn discover(mut self, runtime: &dyn Runtime, progress: &dyn ProgressSink) -> ModValidator {
        progress.update("Discovering mod files");
        self.locators.configure_all(&self.config);

        let mut report = DiscoveryReport::default();
        let scanned = scan_all(&self.locators, runtime, &self.excluded);

        let mut claimed = Vec::new();
        let mut unclaimed = Vec::new();
        for (locator_name, candidates) in scanned {
            for candidate in candidates {
                match self.chain.classify(runtime, &candidate) {
                    Classification::Claimed(mut file) => {
                        file.merge_attributes(
                            &DiscoveryAttributes::default().with_locator(&locator_name),
                        );
                        debug!("Found mod file {} via {}", file.file_name(), file.attributes);
                        claimed.push(file);
                    }
                    Classification::Unclaimed => unclaimed.push(candidate),
                    Classification::Invalid(invalid) => {
                        if invalid.recoverable {
                            report.warning(invalid.to_issue());
                        } else {
                            report.error(invalid.to_issue());
                        }
                    }
                }
            }
        }

        let (mut files, collisions) = UniqueListBuilder::build(claimed);
        for collision in &collisions {
            report.error(collision.to_issue());
        }

        // A collision means the discovered set itself is inconsistent, so
        // embedded resolution over it would compound the damage. Degrade:
        // keep what deduplication salvaged and move on.
        if collisions.is_empty() {
            let outcome = NestedDependencyResolver.resolve(runtime, &files, &self.chain);
            for failure in &outcome.failures {
                report.error(failure.to_issue());
            }
            report.errors.extend(outcome.errors);
            files.extend(outcome.new_files);

            let (deduped, nested_collisions) = UniqueListBuilder::build(files);
            files = deduped;
            for collision in &nested_collisions {
                report.error(collision.to_issue());
            }
        }

        for candidate in &unclaimed {
            if let Some(issue) = self.signatures.diagnose(runtime, candidate) {
                report.warning(issue);
            }
        }

        let mut validator =
            ModValidator::new(files, self.builtins, report, self.require_non_empty);
        validator.stage1(progress);
        validator
    }

    /// Full pipeline: discovery plus both validation stages.
    pub fn discover_and_validate<F>(
        self,
        runtime: &dyn Runtime,
        progress: &dyn ProgressSink,
        capability: F,
    ) -> LoadPlan
    where
        F: Fn(&ModFile) -> Result<(), Vec<Issue>>,
    {
        self.discover(runtime, progress).stage2(progress, capability)
    }
}

/// Scan every locator concurrently, then reassemble results in registration
/// order so downstream stages stay deterministic.
fn scan_all(
    locators: &LocatorSet,
    runtime: &dyn Runtime,
    excluded: &HashSet<PathBuf>,
) -> Vec<(String, Vec<Candidate>)> {
    let ctx = ScanContext { runtime, excluded };
    std::thread::scope(|scope| {
        let handles: Vec<_> = locators
            .iter()
            .map(|locator| {
                let ctx = &ctx;
                scope.spawn(move || (locator.name().to_string(), locator.scan(ctx)))
            })
            .collect();

        handles
            .into_iter()
            .filter_map(|handle| match handle.join() {
                Ok((name, Ok(candidates))) => {
                    debug!("Locator {name} found {} candidate(s)", candidates.len());
                    Some((name, candidates))
                }
                Ok((name, Err(e))) => {
                    warn!("Locator {name} failed to scan, skipping: {e:#}");
                    None
                }
                Err(_) => {
                    warn!("A locator scan panicked, skipping its results");
                    None
                }
            })
            .collect()
    })
}

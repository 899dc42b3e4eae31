//! Two-stage validation of the deduplicated candidate set.
//!
//! Stage one weeds out files whose declared mod entries are not
//! self-consistent. Stage two applies a caller-supplied capability check and
//! orders the survivors so every mod loads after its dependencies.

use log::{debug, warn};
use std::collections::HashSet;

use crate::error::ValidationError;
use crate::model::{FileKind, ModFile};
use crate::progress::ProgressSink;
use crate::report::{DiscoveryReport, Issue, LoadPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationState {
    Unvalidated,
    Stage1Done,
    Stage2Done,
    Failed,
}

/// Carries the candidate set and accumulated report through both stages.
pub struct ModValidator {
    candidates: Vec<ModFile>,
    builtins: Vec<ModFile>,
    report: DiscoveryReport,
    state: ValidationState,
    /// When set, ending up with zero candidates after a non-empty discovery
    /// is fatal rather than an empty-but-valid plan.
    require_non_empty: bool,
}

impl ModValidator {
    pub fn new(
        candidates: Vec<ModFile>,
        builtins: Vec<ModFile>,
        report: DiscoveryReport,
        require_non_empty: bool,
    ) -> Self {
        Self {
            candidates,
            builtins,
            report,
            state: ValidationState::Unvalidated,
            require_non_empty,
        }
    }

    pub fn state(&self) -> ValidationState {
        self.state
    }

    /// Drop candidates whose declared mod entries fail the consistency
    /// check. Each drop is a warning, never an abort.
    #[tracing::instrument(skip(self, progress))]
    pub fn stage1(&mut self, progress: &dyn ProgressSink) {
        let started_non_empty = !self.candidates.is_empty();
        self.candidates.retain(|file| {
            if file.identify_mods() {
                true
            } else {
                warn!("Rejecting mod file {}: inconsistent mod entries", file.file_name());
                self.report.warnings.push(Issue::with_path(
                    "inconsistent mod entries",
                    file.contents.primary_path(),
                ));
                false
            }
        });

        progress.update(&format!("Found {} mod candidates", self.candidates.len()));

        if self.require_non_empty && started_non_empty && self.candidates.is_empty() {
            self.report.error(ValidationError::NothingToLoad.to_issue());
            self.state = ValidationState::Failed;
        } else {
            self.state = ValidationState::Stage1Done;
        }
    }

    /// Run the capability check over the survivors and produce the ordered
    /// plan. A dependency cycle is fatal and yields an empty plan.
    #[tracing::instrument(skip(self, progress, capability))]
    pub fn stage2<F>(mut self, progress: &dyn ProgressSink, capability: F) -> LoadPlan
    where
        F: Fn(&ModFile) -> Result<(), Vec<Issue>>,
    {
        if self.state == ValidationState::Unvalidated {
            self.stage1(progress);
        }
        if self.state == ValidationState::Failed {
            return LoadPlan::new(Vec::new(), self.report);
        }

        progress.update("Validating mod files");
        let mut survivors = Vec::new();
        for file in self.candidates {
            match capability(&file) {
                Ok(()) => survivors.push(file),
                Err(issues) => {
                    warn!("Rejecting mod file {}: capability check failed", file.file_name());
                    self.report.errors.extend(issues);
                }
            }
        }

        let ordered = match order_by_dependencies(survivors) {
            Ok(ordered) => ordered,
            Err(cycle) => {
                self.report.error(cycle.to_issue());
                self.state = ValidationState::Failed;
                return LoadPlan::new(Vec::new(), self.report);
            }
        };

        self.state = ValidationState::Stage2Done;
        let mut files = self.builtins;
        files.extend(ordered);
        LoadPlan::new(files, self.report)
    }
}

/// Order files so every mod's declared dependencies load first.
///
/// Only mod-kind files participate in ordering; libraries keep their
/// discovery positions ahead of the sorted mods. Dependencies naming a mod id
/// that no candidate declares are ignored here; range checking against the
/// actual loaded versions is the capability check's business.
fn order_by_dependencies(files: Vec<ModFile>) -> Result<Vec<ModFile>, ValidationError> {
    let (mods, libraries): (Vec<ModFile>, Vec<ModFile>) =
        files.into_iter().partition(|f| f.kind == FileKind::Mod);

    let declared: HashSet<&str> = mods
        .iter()
        .flat_map(|f| f.mods.iter().map(|m| m.id.as_str()))
        .collect();

    // index of the file declaring each mod id
    let owner_of = |id: &str| -> Option<usize> {
        mods.iter().position(|f| f.mods.iter().any(|m| m.id == id))
    };

    let mut edges: Vec<Vec<usize>> = Vec::with_capacity(mods.len());
    for (index, file) in mods.iter().enumerate() {
        let mut prerequisites = Vec::new();
        for info in &file.mods {
            for dependency in &info.dependencies {
                if !declared.contains(dependency.id.as_str()) {
                    debug!(
                        "Ignoring dependency of {} on absent mod `{}` while ordering",
                        file.display_id(),
                        dependency.id
                    );
                    continue;
                }
                if let Some(owner) = owner_of(&dependency.id) {
                    if owner != index {
                        prerequisites.push(owner);
                    }
                }
            }
        }
        edges.push(prerequisites);
    }

    // Kahn's algorithm, always taking the earliest-discovered ready file so
    // independent mods keep their discovery order.
    let mut placed = vec![false; mods.len()];
    let mut order = Vec::with_capacity(mods.len());
    while order.len() < mods.len() {
        let next = (0..mods.len()).find(|&i| {
            !placed[i] && edges[i].iter().all(|&dep| placed[dep])
        });
        match next {
            Some(i) => {
                placed[i] = true;
                order.push(i);
            }
            None => {
                let mut members: Vec<String> = mods
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !placed[*i])
                    .map(|(_, f)| f.display_id())
                    .collect();
                members.sort();
                return Err(ValidationError::DependencyCycle { members });
            }
        }
    }

    let mut sorted_mods: Vec<Option<ModFile>> = mods.into_iter().map(Some).collect();
    let mut result = libraries;
    for index in order {
        if let Some(file) = sorted_mods[index].take() {
            result.push(file);
        }
    }
    Ok(result)
}

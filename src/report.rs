//! Accumulated diagnostics and the final load plan.
//!
//! Stages report their problems back to the orchestrator instead of raising
//! through the call stack, so a single run surfaces everything wrong with a
//! mod set at once.

use std::fmt;
use std::path::PathBuf;

use crate::model::{FileKind, ModFile};

/// One user-visible problem, with the offending path when there is one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub message: String,
    pub path: Option<PathBuf>,
}

impl Issue {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), path: None }
    }

    pub fn with_path(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self { message: message.into(), path: Some(path.into()) }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} ({})", self.message, path.display()),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Fatal errors and warnings gathered across every pipeline stage.
#[derive(Debug, Default, Clone)]
pub struct DiscoveryReport {
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

impl DiscoveryReport {
    pub fn error(&mut self, issue: Issue) {
        self.errors.push(issue);
    }

    pub fn warning(&mut self, issue: Issue) {
        self.warnings.push(issue);
    }

    pub fn extend(&mut self, other: DiscoveryReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// The validated, ordered output of the pipeline. Immutable once produced.
#[derive(Debug)]
pub struct LoadPlan {
    files: Vec<ModFile>,
    report: DiscoveryReport,
}

impl LoadPlan {
    pub fn new(files: Vec<ModFile>, report: DiscoveryReport) -> Self {
        Self { files, report }
    }

    /// All files in load order, built-ins first.
    pub fn files(&self) -> &[ModFile] {
        &self.files
    }

    /// Mods and game libraries: the game-layer resource group.
    pub fn mod_resources(&self) -> Vec<&ModFile> {
        self.files
            .iter()
            .filter(|f| matches!(f.kind, FileKind::Mod | FileKind::GameLibrary))
            .collect()
    }

    /// Plain libraries: the plugin-layer resource group.
    pub fn library_resources(&self) -> Vec<&ModFile> {
        self.files.iter().filter(|f| f.kind == FileKind::Library).collect()
    }

    pub fn errors(&self) -> &[Issue] {
        &self.report.errors
    }

    pub fn warnings(&self) -> &[Issue] {
        &self.report.warnings
    }

    pub fn is_fatal(&self) -> bool {
        self.report.has_errors()
    }
}

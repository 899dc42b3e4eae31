//! Structured failure values produced by the pipeline stages.
//!
//! These are data, not control flow: every stage hands its failures to the
//! orchestrator, which folds them into the discovery report.

use semver::Version;
use std::path::PathBuf;
use thiserror::Error;

use crate::report::Issue;
use crate::resolver::version::VersionRange;

/// A classifier recognized the package shape but could not produce a usable
/// mod file. Fatal unless flagged recoverable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} ({})", path.display())]
pub struct InvalidModFile {
    pub message: String,
    pub path: PathBuf,
    pub recoverable: bool,
}

impl InvalidModFile {
    pub fn new(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self { message: message.into(), path: path.into(), recoverable: false }
    }

    pub fn recoverable(mut self) -> Self {
        self.recoverable = true;
        self
    }

    pub fn to_issue(&self) -> Issue {
        Issue::with_path(self.message.clone(), self.path.clone())
    }
}

/// Two differently-classified mod files claimed the same identity; both are
/// excluded from the deduplicated set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("duplicate mod file identity `{identity}` claimed by: {}", format_paths(paths))]
pub struct IdentityCollision {
    pub identity: String,
    pub paths: Vec<PathBuf>,
}

impl IdentityCollision {
    pub fn to_issue(&self) -> Issue {
        Issue::new(self.to_string())
    }
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
}

/// Why an embedded dependency could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The declared ranges have no common version.
    VersionResolutionFailed,
    /// Parents embed different concrete artifacts for one identifier and the
    /// ranges do not single one out.
    MismatchedContainedDependencies,
}

/// One parent's contribution to a failed resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedBy {
    /// Mod ids (or file name) of the declaring package.
    pub source: String,
    pub requested_range: VersionRange,
    pub embedded_version: Version,
}

/// An embedded dependency that could not be resolved. Aggregated and
/// reported; the declaring parents stay in the set in a degraded state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{}", self.describe())]
pub struct ResolutionFailure {
    pub identifier: String,
    pub reason: FailureReason,
    pub sources: Vec<RequestedBy>,
}

impl ResolutionFailure {
    fn describe(&self) -> String {
        let what = match self.reason {
            FailureReason::VersionResolutionFailed => "conflicting version requirements",
            FailureReason::MismatchedContainedDependencies => "mismatched embedded artifacts",
        };
        let sources = self
            .sources
            .iter()
            .map(|s| {
                format!(
                    "{} requested {} (embeds {})",
                    s.source, s.requested_range, s.embedded_version
                )
            })
            .collect::<Vec<_>>()
            .join("; ");
        format!("embedded dependency `{}` failed: {what}: {sources}", self.identifier)
    }

    pub fn to_issue(&self) -> Issue {
        Issue::new(self.to_string())
    }
}

/// Fatal problems raised by the validator's second stage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("dependency cycle between: {}", members.join(", "))]
    DependencyCycle { members: Vec<String> },
    #[error("no loadable mod files remained after validation")]
    NothingToLoad,
}

impl ValidationError {
    pub fn to_issue(&self) -> Issue {
        Issue::new(self.to_string())
    }
}

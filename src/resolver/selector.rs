//! Pure selection core for embedded dependencies.
//!
//! Given every embedded-dependency declaration gathered from a set of parent
//! packages, groups them by identifier, intersects the requested ranges and
//! picks the concrete embedded artifact to extract. Stateless and
//! deterministic: the same declarations always produce the same selections.

use semver::Version;
use std::collections::HashMap;

use crate::error::{FailureReason, RequestedBy, ResolutionFailure};
use crate::resolver::version::VersionRange;

/// One embedded-dependency declaration, tied to the parent (`source`) that
/// carries the embedded artifact.
#[derive(Debug, Clone)]
pub struct Declared<S> {
    pub source: S,
    /// Human-readable name of the declaring package, for diagnostics.
    pub source_name: String,
    pub identifier: String,
    pub range: VersionRange,
    /// Concrete version of the artifact embedded by this parent.
    pub version: Version,
    /// Where the embedded artifact lives inside the parent.
    pub path: String,
}

/// The artifact chosen for one identifier.
#[derive(Debug, Clone)]
pub struct Selected<S> {
    pub identifier: String,
    pub version: Version,
    pub source: S,
    pub path: String,
}

/// Resolve all declarations: one selection per identifier, or a failure
/// citing every contributing parent.
pub fn select<S: Clone>(
    declarations: &[Declared<S>],
) -> (Vec<Selected<S>>, Vec<ResolutionFailure>) {
    // Group by identifier, preserving first-seen order for determinism.
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&Declared<S>>> = HashMap::new();
    for declaration in declarations {
        let entry = groups.entry(&declaration.identifier).or_default();
        if entry.is_empty() {
            order.push(&declaration.identifier);
        }
        entry.push(declaration);
    }

    let mut selections = Vec::new();
    let mut failures = Vec::new();

    for identifier in order {
        let group = &groups[identifier];
        let intersection = group
            .iter()
            .map(|d| &d.range)
            .fold(VersionRange::any(), |acc, r| acc.intersect(r));

        if intersection.is_empty() {
            failures.push(failure(identifier, FailureReason::VersionResolutionFailed, group));
            continue;
        }

        let mut candidates: Vec<&&Declared<S>> = group
            .iter()
            .filter(|d| intersection.contains(&d.version))
            .collect();

        if candidates.is_empty() {
            // The ranges overlap but no parent embeds a version inside the
            // overlap. Differing embedded versions mean the parents disagree
            // about the artifact itself; a single embedded version is a plain
            // unsatisfiable requirement.
            let mismatched = group.iter().any(|d| d.version != group[0].version);
            let reason = if mismatched {
                FailureReason::MismatchedContainedDependencies
            } else {
                FailureReason::VersionResolutionFailed
            };
            failures.push(failure(identifier, reason, group));
            continue;
        }

        // Highest satisfying version wins; earliest declaration breaks ties
        // so re-running yields the same extraction source.
        candidates.sort_by(|a, b| b.version.cmp(&a.version));
        let chosen = candidates[0];
        selections.push(Selected {
            identifier: identifier.to_string(),
            version: chosen.version.clone(),
            source: chosen.source.clone(),
            path: chosen.path.clone(),
        });
    }

    (selections, failures)
}

fn failure<S>(
    identifier: &str,
    reason: FailureReason,
    group: &[&Declared<S>],
) -> ResolutionFailure {
    ResolutionFailure {
        identifier: identifier.to_string(),
        reason,
        sources: group
            .iter()
            .map(|d| RequestedBy {
                source: d.source_name.clone(),
                requested_range: d.range.clone(),
                embedded_version: d.version.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::version::parse_version_lenient;

    fn declared(source: &str, identifier: &str, range: &str, version: &str) -> Declared<String> {
        Declared {
            source: source.to_string(),
            source_name: source.to_string(),
            identifier: identifier.to_string(),
            range: range.parse().unwrap(),
            version: parse_version_lenient(version).unwrap(),
            path: format!("embedded/{identifier}-{version}.zip"),
        }
    }

    #[test]
    fn test_overlapping_ranges_select_embedded_version() {
        let declarations = vec![
            declared("alpha", "corelib", "[1.0,2.0)", "1.8"),
            declared("beta", "corelib", "[1.5,3.0)", "1.8"),
        ];
        let (selections, failures) = select(&declarations);
        assert!(failures.is_empty());
        assert_eq!(selections.len(), 1);
        assert_eq!(selections[0].version, parse_version_lenient("1.8").unwrap());
        assert_eq!(selections[0].source, "alpha");
    }

    #[test]
    fn test_disjoint_ranges_fail_citing_both() {
        let declarations = vec![
            declared("alpha", "corelib", "[1.0,1.2)", "1.1"),
            declared("beta", "corelib", "[1.5,2.0)", "1.8"),
        ];
        let (selections, failures) = select(&declarations);
        assert!(selections.is_empty());
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].reason, FailureReason::VersionResolutionFailed);
        let sources: Vec<&str> =
            failures[0].sources.iter().map(|s| s.source.as_str()).collect();
        assert_eq!(sources, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_highest_satisfying_version_wins() {
        let declarations = vec![
            declared("alpha", "corelib", "[1.0,)", "1.2"),
            declared("beta", "corelib", "[1.0,)", "1.9"),
            declared("gamma", "corelib", "[1.0,2.0)", "1.5"),
        ];
        let (selections, failures) = select(&declarations);
        assert!(failures.is_empty());
        assert_eq!(selections[0].version, parse_version_lenient("1.9").unwrap());
        assert_eq!(selections[0].source, "beta");
    }

    #[test]
    fn test_mismatched_embedded_artifacts() {
        // Ranges overlap around [2.0,2.5) but the parents embed 1.0 and 3.0:
        // they disagree about the artifact and the ranges cannot pick one.
        let declarations = vec![
            declared("alpha", "corelib", "[2.0,3.0)", "1.0"),
            declared("beta", "corelib", "[1.0,2.5)", "3.0"),
        ];
        let (selections, failures) = select(&declarations);
        assert!(selections.is_empty());
        assert_eq!(
            failures[0].reason,
            FailureReason::MismatchedContainedDependencies
        );
    }

    #[test]
    fn test_single_parent_unsatisfiable_range_fails() {
        // One parent whose own embedded version misses its requested range:
        // treated exactly like a conflict, not auto-accepted.
        let declarations = vec![declared("alpha", "corelib", "[2.0,3.0)", "1.0")];
        let (selections, failures) = select(&declarations);
        assert!(selections.is_empty());
        assert_eq!(failures[0].reason, FailureReason::VersionResolutionFailed);
        assert_eq!(failures[0].sources.len(), 1);
    }

    #[test]
    fn test_independent_identifiers_resolve_separately() {
        let declarations = vec![
            declared("alpha", "corelib", "[1.0,)", "1.0"),
            declared("alpha", "renderlib", "[2.0,)", "2.3"),
        ];
        let (selections, failures) = select(&declarations);
        assert!(failures.is_empty());
        let ids: Vec<&str> = selections.iter().map(|s| s.identifier.as_str()).collect();
        assert_eq!(ids, vec!["corelib", "renderlib"]);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let declarations = vec![
            declared("alpha", "corelib", "[1.0,)", "1.8"),
            declared("beta", "corelib", "[1.0,)", "1.8"),
        ];
        let (first, _) = select(&declarations);
        let (second, _) = select(&declarations);
        assert_eq!(first[0].source, second[0].source);
        assert_eq!(first[0].source, "alpha");
    }

    #[test]
    fn test_empty_input() {
        let (selections, failures) = select::<String>(&[]);
        assert!(selections.is_empty());
        assert!(failures.is_empty());
    }
}

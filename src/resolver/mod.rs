//! Nested-dependency resolution: dependencies embedded inside already
//! accepted packages are version-resolved, extracted into scoped views and
//! merged into the load set.

pub mod selector;
pub mod version;

use anyhow::{Context, Result};
use log::{debug, info};
use semver::Version;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::classifier::{Classification, ClassifierChain};
use crate::error::{FailureReason, RequestedBy, ResolutionFailure};
use crate::model::{
    Candidate, DiscoveryAttributes, ExtractionView, FileKind, IdentityKey, ModFile,
    PackageContents,
};
use crate::report::Issue;
use crate::runtime::Runtime;
use self::selector::{Declared, Selected, select};
use self::version::{VersionRange, parse_version_lenient};

/// Manifest of archives embedded inside a package.
pub const EMBEDDED_MANIFEST: &str = "embedded/deps.json";

/// Hard ceiling on resolution passes; extraction can reveal further embedded
/// dependencies, but never endlessly.
pub const MAX_RESOLVE_PASSES: usize = 16;

#[derive(Debug, Deserialize)]
struct EmbeddedDeps {
    #[serde(default)]
    deps: Vec<EmbeddedDepEntry>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedDepEntry {
    identifier: String,
    range: VersionRange,
    version: String,
    path: String,
}

/// Everything the resolver produced: files to merge into the load set plus
/// aggregated, non-fatal failures.
#[derive(Debug, Default)]
pub struct ResolverOutcome {
    pub new_files: Vec<ModFile>,
    pub failures: Vec<ResolutionFailure>,
    pub errors: Vec<Issue>,
}

struct SourceRef {
    identity: IdentityKey,
    contents: PackageContents,
    name: String,
}

/// A dependency chosen in an earlier pass, kept so later declarations of the
/// same identifier can still be range-checked against the chosen version.
struct ResolvedEntry {
    version: Version,
    sources: Vec<RequestedBy>,
}

pub struct NestedDependencyResolver;

impl NestedDependencyResolver {
    pub const NAME: &'static str = "embedded dependencies";

    /// Resolve embedded dependencies of `files` to a fixed point.
    ///
    /// Extraction is serialized: each pass extracts its selections one at a
    /// time, so no two extractions hold views over one parent concurrently.
    #[tracing::instrument(skip(self, runtime, files, chain))]
    pub fn resolve(
        &self,
        runtime: &dyn Runtime,
        files: &[ModFile],
        chain: &ClassifierChain,
    ) -> ResolverOutcome {
        let mut outcome = ResolverOutcome::default();
        let mut resolved: HashMap<String, ResolvedEntry> = HashMap::new();
        let mut sources: Vec<SourceRef> = Vec::new();

        let mut frontier: Vec<(usize, PackageContents)> = files
            .iter()
            .map(|f| {
                sources.push(SourceRef {
                    identity: f.identity().clone(),
                    contents: f.contents.clone(),
                    name: f.display_id(),
                });
                (sources.len() - 1, f.contents.clone())
            })
            .collect();

        let mut pass = 0;
        while !frontier.is_empty() {
            let declarations = self.gather(runtime, &frontier, &sources, &mut outcome.errors);
            let fresh = check_against_resolved(declarations, &mut resolved, &mut outcome.failures);
            if fresh.is_empty() {
                break;
            }
            if pass >= MAX_RESOLVE_PASSES {
                for declaration in &fresh {
                    outcome.errors.push(Issue::new(format!(
                        "embedded dependency `{}` left unresolved: recursion ceiling of {} passes reached",
                        declaration.identifier, MAX_RESOLVE_PASSES
                    )));
                }
                break;
            }

            let (selections, failures) = select(&fresh);
            outcome.failures.extend(failures);

            let mut next_frontier = Vec::new();
            for selection in selections {
                resolved.insert(
                    selection.identifier.clone(),
                    ResolvedEntry {
                        version: selection.version.clone(),
                        sources: requesters_of(&fresh, &selection.identifier),
                    },
                );
                match self.extract(runtime, &sources, &selection, chain) {
                    Ok(file) => {
                        sources.push(SourceRef {
                            identity: file.identity().clone(),
                            contents: file.contents.clone(),
                            name: file.display_id(),
                        });
                        next_frontier.push((sources.len() - 1, file.contents.clone()));
                        outcome.new_files.push(file);
                    }
                    Err(e) => {
                        outcome.errors.push(Issue::new(format!(
                            "failed to extract embedded dependency `{}`: {e:#}",
                            selection.identifier
                        )));
                    }
                }
            }

            frontier = next_frontier;
            pass += 1;
        }

        if outcome.new_files.is_empty() {
            info!("No embedded dependencies to load found. Skipping!");
        } else {
            info!(
                "Found {} embedded dependencies, adding them to the mods collection",
                outcome.new_files.len()
            );
        }
        outcome
    }

    /// Read the embedded-dependency manifests of one frontier. A missing
    /// manifest means "no embedded dependencies"; an unparsable one is a
    /// non-fatal error for that package only.
    fn gather(
        &self,
        runtime: &dyn Runtime,
        frontier: &[(usize, PackageContents)],
        sources: &[SourceRef],
        errors: &mut Vec<Issue>,
    ) -> Vec<Declared<usize>> {
        let mut declarations = Vec::new();
        for (source_index, contents) in frontier {
            let source = &sources[*source_index];
            let raw = match contents.read_file(runtime, EMBEDDED_MANIFEST) {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    debug!("Could not read {} from {}: {e:#}", EMBEDDED_MANIFEST, source.name);
                    continue;
                }
            };

            let manifest: EmbeddedDeps = match serde_json::from_slice(&raw) {
                Ok(manifest) => manifest,
                Err(e) => {
                    errors.push(Issue::with_path(
                        format!("malformed embedded dependency manifest: {e}"),
                        contents.primary_path(),
                    ));
                    continue;
                }
            };

            for entry in manifest.deps {
                let embedded_version = match parse_version_lenient(&entry.version) {
                    Ok(version) => version,
                    Err(e) => {
                        errors.push(Issue::with_path(
                            format!("embedded dependency `{}`: {e}", entry.identifier),
                            contents.primary_path(),
                        ));
                        continue;
                    }
                };
                declarations.push(Declared {
                    source: *source_index,
                    source_name: source.name.clone(),
                    identifier: entry.identifier,
                    range: entry.range,
                    version: embedded_version,
                    path: entry.path,
                });
            }
        }
        declarations
    }

    /// Pull the selected artifact out of its parent into a fresh scoped view
    /// and classify it. Unclaimed extractions default to plain libraries.
    fn extract(
        &self,
        runtime: &dyn Runtime,
        sources: &[SourceRef],
        selection: &Selected<usize>,
        chain: &ClassifierChain,
    ) -> Result<ModFile> {
        let source = &sources[selection.source];
        let file_name = selection
            .path
            .rsplit('/')
            .next()
            .filter(|n| !n.is_empty())
            .unwrap_or(&selection.identifier);

        let view = ExtractionView::create()?;
        let dest = view.path().join(file_name);
        source
            .contents
            .extract_file(runtime, &selection.path, &dest)
            .with_context(|| format!("extracting from {}", source.name))?;

        debug!(
            "Extracted embedded dependency {} {} from {}",
            selection.identifier, selection.version, source.name
        );

        let candidate = Candidate::new(PackageContents::single(dest));
        let mut file = match chain.classify(runtime, &candidate) {
            Classification::Claimed(file) => file,
            Classification::Unclaimed => ModFile::new(
                runtime,
                candidate.contents.clone(),
                FileKind::Library,
                Vec::new(),
                DiscoveryAttributes::default(),
            ),
            Classification::Invalid(invalid) => {
                anyhow::bail!("{invalid}");
            }
        };

        file.merge_attributes(
            &DiscoveryAttributes::default()
                .with_parent(source.identity.clone())
                .with_dependency_resolver(Self::NAME),
        );
        file.set_view(Arc::new(view));
        Ok(file)
    }
}

/// Split out declarations whose identifier was chosen in an earlier pass.
///
/// A repeat declaration does not trigger a second extraction, but its range
/// must still admit the chosen version; one that excludes it is a conflict
/// citing the original requesters plus the new declarer.
fn check_against_resolved(
    declarations: Vec<Declared<usize>>,
    resolved: &mut HashMap<String, ResolvedEntry>,
    failures: &mut Vec<ResolutionFailure>,
) -> Vec<Declared<usize>> {
    let mut fresh = Vec::new();
    for declaration in declarations {
        let Some(entry) = resolved.get_mut(&declaration.identifier) else {
            fresh.push(declaration);
            continue;
        };
        let requester = RequestedBy {
            source: declaration.source_name.clone(),
            requested_range: declaration.range.clone(),
            embedded_version: declaration.version.clone(),
        };
        if declaration.range.contains(&entry.version) {
            entry.sources.push(requester);
        } else {
            let mut sources = entry.sources.clone();
            sources.push(requester);
            failures.push(ResolutionFailure {
                identifier: declaration.identifier.clone(),
                reason: FailureReason::VersionResolutionFailed,
                sources,
            });
        }
    }
    fresh
}

fn requesters_of(declarations: &[Declared<usize>], identifier: &str) -> Vec<RequestedBy> {
    declarations
        .iter()
        .filter(|d| d.identifier == identifier)
        .map(|d| RequestedBy {
            source: d.source_name.clone(),
            requested_range: d.range.clone(),
            embedded_version: d.version.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::test_support::write_zip;
    use crate::model::DiscoveryAttributes;
    use crate::runtime::RealRuntime;
    use tempfile::tempdir;

    fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inner.zip");
        write_zip(&path, files);
        std::fs::read(path).unwrap()
    }

    fn mod_file(path: &std::path::Path) -> ModFile {
        ModFile::new(
            &RealRuntime,
            PackageContents::single(path),
            FileKind::Mod,
            vec![],
            DiscoveryAttributes::default(),
        )
    }

    fn resolve(files: &[ModFile]) -> ResolverOutcome {
        NestedDependencyResolver.resolve(&RealRuntime, files, &ClassifierChain::standard())
    }

    #[test_log::test]
    fn test_no_manifest_means_no_dependencies() {
        let dir = tempdir().unwrap();
        let pack = dir.path().join("plain.zip");
        write_zip(&pack, &[("modinfo.json", b"{\"mods\": []}")]);

        let outcome = resolve(&[mod_file(&pack)]);
        assert!(outcome.new_files.is_empty());
        assert!(outcome.failures.is_empty());
        assert!(outcome.errors.is_empty());
    }

    #[test_log::test]
    fn test_extracts_embedded_library() {
        let dir = tempdir().unwrap();
        let inner = zip_bytes(&[("libinfo.json", br#"{"type": "library"}"#)]);
        let pack = dir.path().join("host.zip");
        write_zip(
            &pack,
            &[
                (
                    "embedded/deps.json",
                    br#"{"deps": [{"identifier": "corelib", "range": "[1.0,2.0)",
                         "version": "1.8", "path": "embedded/corelib-1.8.zip"}]}"#,
                ),
                ("embedded/corelib-1.8.zip", &inner),
            ],
        );

        let host = mod_file(&pack);
        let outcome = resolve(std::slice::from_ref(&host));
        assert!(outcome.failures.is_empty(), "{:?}", outcome.failures);
        assert_eq!(outcome.new_files.len(), 1);

        let extracted = &outcome.new_files[0];
        assert_eq!(extracted.kind, FileKind::Library);
        assert_eq!(extracted.attributes.parent.as_ref(), Some(host.identity()));
        assert_eq!(
            extracted.attributes.dependency_resolver.as_deref(),
            Some(NestedDependencyResolver::NAME)
        );
        assert!(extracted.contents.primary_path().exists());
    }

    #[test_log::test]
    fn test_unclaimed_extraction_defaults_to_library() {
        let dir = tempdir().unwrap();
        let inner = zip_bytes(&[("code.bin", b"x")]);
        let pack = dir.path().join("host.zip");
        write_zip(
            &pack,
            &[
                (
                    "embedded/deps.json",
                    br#"{"deps": [{"identifier": "blob", "range": "[1.0,)",
                         "version": "1.0", "path": "embedded/blob.zip"}]}"#,
                ),
                ("embedded/blob.zip", &inner),
            ],
        );

        let outcome = resolve(&[mod_file(&pack)]);
        assert_eq!(outcome.new_files.len(), 1);
        assert_eq!(outcome.new_files[0].kind, FileKind::Library);
        assert!(outcome.new_files[0].mods.is_empty());
    }

    #[test_log::test]
    fn test_recursive_extraction_reaches_fixed_point() {
        let dir = tempdir().unwrap();
        // innermost: a plain library
        let leaf = zip_bytes(&[("libinfo.json", br#"{"type": "library"}"#)]);
        // middle: embeds the leaf
        let middle = zip_bytes(&[
            (
                "embedded/deps.json",
                br#"{"deps": [{"identifier": "leaf", "range": "[1.0,)",
                     "version": "1.0", "path": "embedded/leaf.zip"}]}"#,
            ),
            ("embedded/leaf.zip", &leaf),
        ]);
        let pack = dir.path().join("host.zip");
        write_zip(
            &pack,
            &[
                (
                    "embedded/deps.json",
                    br#"{"deps": [{"identifier": "middle", "range": "[1.0,)",
                         "version": "1.0", "path": "embedded/middle.zip"}]}"#,
                ),
                ("embedded/middle.zip", &middle),
            ],
        );

        let outcome = resolve(&[mod_file(&pack)]);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.new_files.len(), 2);
        // The leaf's parent is the extracted middle package.
        assert_eq!(
            outcome.new_files[1].attributes.parent.as_ref(),
            Some(outcome.new_files[0].identity())
        );
    }

    #[test_log::test]
    fn test_conflicting_ranges_reported_not_fatal() {
        let dir = tempdir().unwrap();
        let inner = zip_bytes(&[("code.bin", b"x")]);
        let a = dir.path().join("a.zip");
        write_zip(
            &a,
            &[
                (
                    "embedded/deps.json",
                    br#"{"deps": [{"identifier": "corelib", "range": "[1.0,1.2)",
                         "version": "1.1", "path": "embedded/corelib.zip"}]}"#,
                ),
                ("embedded/corelib.zip", &inner),
            ],
        );
        let b = dir.path().join("b.zip");
        write_zip(
            &b,
            &[
                (
                    "embedded/deps.json",
                    br#"{"deps": [{"identifier": "corelib", "range": "[1.5,2.0)",
                         "version": "1.8", "path": "embedded/corelib.zip"}]}"#,
                ),
                ("embedded/corelib.zip", &inner),
            ],
        );

        let outcome = resolve(&[mod_file(&a), mod_file(&b)]);
        assert!(outcome.new_files.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].identifier, "corelib");
        assert_eq!(outcome.failures[0].sources.len(), 2);
    }

    #[test_log::test]
    fn test_malformed_manifest_is_nonfatal_error() {
        let dir = tempdir().unwrap();
        let pack = dir.path().join("bad.zip");
        write_zip(&pack, &[("embedded/deps.json", b"{ nope")]);

        let outcome = resolve(&[mod_file(&pack)]);
        assert!(outcome.new_files.is_empty());
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].message.contains("malformed"));
    }

    #[test_log::test]
    fn test_extracted_view_survives_with_file() {
        let dir = tempdir().unwrap();
        let inner = zip_bytes(&[("code.bin", b"x")]);
        let pack = dir.path().join("host.zip");
        write_zip(
            &pack,
            &[
                (
                    "embedded/deps.json",
                    br#"{"deps": [{"identifier": "blob", "range": "[1.0,)",
                         "version": "1.0", "path": "embedded/blob.zip"}]}"#,
                ),
                ("embedded/blob.zip", &inner),
            ],
        );

        let outcome = resolve(&[mod_file(&pack)]);
        let extracted = outcome.new_files.into_iter().next().unwrap();
        let extracted_path = extracted.contents.primary_path().to_path_buf();
        assert!(extracted_path.exists());
        drop(extracted);
        assert!(!extracted_path.exists());
    }

    fn host_embedding_util(dir: &std::path::Path, util_range_on_corelib: &str) -> ModFile {
        // corelib is selected in the first pass from the host; util, extracted
        // alongside it, declares corelib again in its own manifest.
        let corelib = zip_bytes(&[("code.bin", b"x")]);
        let util_deps = format!(
            r#"{{"deps": [{{"identifier": "corelib", "range": "{util_range_on_corelib}",
                 "version": "2.0", "path": "embedded/corelib.zip"}}]}}"#
        );
        let util = zip_bytes(&[
            ("embedded/deps.json", util_deps.as_bytes()),
            ("embedded/corelib.zip", &corelib),
        ]);

        let pack = dir.join("host.zip");
        write_zip(
            &pack,
            &[
                (
                    "embedded/deps.json",
                    br#"{"deps": [
                        {"identifier": "corelib", "range": "[1.0,)",
                         "version": "1.0", "path": "embedded/corelib.zip"},
                        {"identifier": "util", "range": "[1.0,)",
                         "version": "1.0", "path": "embedded/util.zip"}]}"#,
                ),
                ("embedded/corelib.zip", &corelib),
                ("embedded/util.zip", &util),
            ],
        );
        mod_file(&pack)
    }

    #[test_log::test]
    fn test_later_declaration_conflicting_with_selection_fails() {
        let dir = tempdir().unwrap();
        let host = host_embedding_util(dir.path(), "[2.0,)");

        let outcome = resolve(&[host]);
        // corelib 1.0 and util were extracted before util's own declaration
        // surfaced; the conflict with the chosen 1.0 must still be reported.
        assert_eq!(outcome.new_files.len(), 2);
        assert_eq!(outcome.failures.len(), 1);

        let failure = &outcome.failures[0];
        assert_eq!(failure.identifier, "corelib");
        assert_eq!(failure.reason, FailureReason::VersionResolutionFailed);
        let cited: Vec<&str> = failure.sources.iter().map(|s| s.source.as_str()).collect();
        assert_eq!(cited, vec!["host.zip", "util.zip"]);
    }

    #[test_log::test]
    fn test_later_declaration_within_selected_range_is_satisfied() {
        let dir = tempdir().unwrap();
        let host = host_embedding_util(dir.path(), "[1.0,)");

        let outcome = resolve(&[host]);
        // util's redeclaration admits the chosen 1.0: no second extraction,
        // no failure.
        assert_eq!(outcome.new_files.len(), 2);
        assert!(outcome.failures.is_empty());
        assert!(outcome.errors.is_empty());
    }

    #[test_log::test]
    fn test_recursion_ceiling_reports_pending_dependencies() {
        let dir = tempdir().unwrap();

        // A chain one level deeper than the pass ceiling: lib1 embeds lib2,
        // which embeds lib3, and so on.
        let depth = MAX_RESOLVE_PASSES + 1;
        let mut inner = zip_bytes(&[("code.bin", b"x")]);
        for level in (1..depth).rev() {
            let child = level + 1;
            let deps = format!(
                r#"{{"deps": [{{"identifier": "lib{child}", "range": "[1.0,)",
                     "version": "1.0", "path": "embedded/lib{child}.zip"}}]}}"#
            );
            let entry_name = format!("embedded/lib{child}.zip");
            inner = zip_bytes(&[
                ("embedded/deps.json", deps.as_bytes()),
                (entry_name.as_str(), &inner),
            ]);
        }
        let pack = dir.path().join("host.zip");
        write_zip(
            &pack,
            &[
                (
                    "embedded/deps.json",
                    br#"{"deps": [{"identifier": "lib1", "range": "[1.0,)",
                         "version": "1.0", "path": "embedded/lib1.zip"}]}"#,
                ),
                ("embedded/lib1.zip", &inner),
            ],
        );

        let outcome = resolve(&[mod_file(&pack)]);
        assert_eq!(outcome.new_files.len(), MAX_RESOLVE_PASSES);
        assert_eq!(outcome.errors.len(), 1);
        let message = &outcome.errors[0].message;
        assert!(message.contains(&format!("lib{depth}")), "{message}");
        assert!(message.contains("recursion ceiling"), "{message}");
    }
}

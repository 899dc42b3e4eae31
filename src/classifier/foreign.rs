use log::warn;

use crate::model::Candidate;
use crate::report::Issue;
use crate::runtime::Runtime;

/// Ordered table of marker files identifying packages built for other
/// loaders. Used for the best-effort "why was this not claimed" diagnosis of
/// unclaimed candidates; a match produces a warning, never an error.
pub struct ForeignSignatures {
    signatures: Vec<(String, String)>,
}

impl Default for ForeignSignatures {
    fn default() -> Self {
        Self::new(vec![
            ("fabric.mod.json", "brokenfile.fabric"),
            ("quilt.mod.json", "brokenfile.quilt"),
            ("mods.toml", "brokenfile.legacyforge"),
            ("mcmod.info", "brokenfile.oldforge"),
            ("litemod.json", "brokenfile.liteloader"),
            ("plugin.yml", "brokenfile.bukkit"),
        ])
    }
}

impl ForeignSignatures {
    pub fn new(pairs: Vec<(&str, &str)>) -> Self {
        Self {
            signatures: pairs
                .into_iter()
                .map(|(marker, key)| (marker.to_string(), key.to_string()))
                .collect(),
        }
    }

    /// The diagnostic key of the first matching marker, if any.
    pub fn identify(&self, runtime: &dyn Runtime, candidate: &Candidate) -> Option<&str> {
        self.signatures.iter().find_map(|(marker, key)| {
            match candidate.contents.contains_file(runtime, marker) {
                Ok(true) => Some(key.as_str()),
                // Unreadable packages were already reported during
                // classification; nothing to diagnose here.
                Ok(false) | Err(_) => None,
            }
        })
    }

    /// Diagnose one unclaimed candidate: warning when a foreign marker
    /// matches, silence otherwise.
    pub fn diagnose(&self, runtime: &dyn Runtime, candidate: &Candidate) -> Option<Issue> {
        let key = self.identify(runtime, candidate)?;
        let path = candidate.contents.primary_path();
        warn!("Found foreign package {:?} ({key}). Skipping.", path);
        Some(Issue::with_path(key, path))
    }
}

use log::debug;

use super::{Classification, Classifier};
use crate::error::InvalidModFile;
use crate::model::{Candidate, DiscoveryAttributes, ModFile, ModManifest};
use crate::runtime::Runtime;

/// Claims packages carrying a `modinfo.json` manifest.
pub struct ModManifestClassifier;

impl Classifier for ModManifestClassifier {
    fn name(&self) -> &str {
        "mod manifest"
    }

    #[tracing::instrument(skip(self, runtime, candidate))]
    fn classify(&self, runtime: &dyn Runtime, candidate: &Candidate) -> Classification {
        let raw = match candidate.contents.read_file(runtime, ModManifest::FILE) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Classification::Unclaimed,
            Err(e) => {
                // The package itself is unreadable, not merely foreign.
                return Classification::Invalid(InvalidModFile::new(
                    format!("Unreadable package: {e:#}"),
                    candidate.contents.primary_path(),
                ));
            }
        };

        let manifest = match ModManifest::parse(&raw) {
            Ok(manifest) => manifest,
            Err(e) => {
                return Classification::Invalid(InvalidModFile::new(
                    format!("{e:#}"),
                    candidate.contents.primary_path(),
                ));
            }
        };

        let mods = match manifest.mod_infos() {
            Ok(mods) => mods,
            Err(e) => {
                return Classification::Invalid(InvalidModFile::new(
                    format!("{e:#}"),
                    candidate.contents.primary_path(),
                ));
            }
        };

        debug!(
            "Classified {} as {} with {} mod(s)",
            candidate.contents.display_name(),
            manifest.file_kind(),
            mods.len()
        );
        Classification::Claimed(ModFile::new(
            runtime,
            candidate.contents.clone(),
            manifest.file_kind(),
            mods,
            DiscoveryAttributes::default(),
        ))
    }
}

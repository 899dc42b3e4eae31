use super::{Classification, Classifier};
use crate::error::InvalidModFile;
use crate::model::{Candidate, DiscoveryAttributes, LibraryManifest, ModFile};
use crate::runtime::Runtime;

/// Claims entry-less library packages marked with `libinfo.json`.
pub struct LibraryClassifier;

impl Classifier for LibraryClassifier {
    fn name(&self) -> &str {
        "library marker"
    }

    fn classify(&self, runtime: &dyn Runtime, candidate: &Candidate) -> Classification {
        let raw = match candidate.contents.read_file(runtime, LibraryManifest::FILE) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Classification::Unclaimed,
            Err(e) => {
                return Classification::Invalid(InvalidModFile::new(
                    format!("Unreadable package: {e:#}"),
                    candidate.contents.primary_path(),
                ));
            }
        };

        match LibraryManifest::parse(&raw) {
            Ok(manifest) => Classification::Claimed(ModFile::new(
                runtime,
                candidate.contents.clone(),
                manifest.kind.into(),
                Vec::new(),
                DiscoveryAttributes::default(),
            )),
            Err(e) => Classification::Invalid(InvalidModFile::new(
                format!("{e:#}"),
                candidate.contents.primary_path(),
            )),
        }
    }
}

//! Classifiers turn candidates into mod files.
//!
//! The chain is tried in configuration order per candidate; the first
//! classifier that does not return [`Classification::Unclaimed`] claims it.
//! A classifier that recognizes a broken-but-foreign package shape must not
//! claim it; claiming is reserved for producing a usable mod file.

mod foreign;
mod library;
mod manifest;

pub use foreign::ForeignSignatures;
pub use library::LibraryClassifier;
pub use manifest::ModManifestClassifier;

use crate::error::InvalidModFile;
use crate::model::{Candidate, ModFile};
use crate::runtime::Runtime;

/// Outcome of one classifier looking at one candidate.
#[derive(Debug)]
pub enum Classification {
    /// The candidate is claimed and a usable mod file was produced.
    Claimed(ModFile),
    /// This classifier does not recognize the package shape.
    Unclaimed,
    /// Recognized shape, unusable contents. Fatal unless recoverable.
    Invalid(InvalidModFile),
}

pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    fn classify(&self, runtime: &dyn Runtime, candidate: &Candidate) -> Classification;
}

/// Ordered classifier chain: first non-unclaimed result wins.
#[derive(Default)]
pub struct ClassifierChain {
    classifiers: Vec<Box<dyn Classifier>>,
}

impl ClassifierChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard chain: mod manifests first, then library markers.
    pub fn standard() -> Self {
        let mut chain = Self::new();
        chain.register(Box::new(ModManifestClassifier));
        chain.register(Box::new(LibraryClassifier));
        chain
    }

    pub fn register(&mut self, classifier: Box<dyn Classifier>) {
        self.classifiers.push(classifier);
    }

    pub fn classify(&self, runtime: &dyn Runtime, candidate: &Candidate) -> Classification {
        for classifier in &self.classifiers {
            match classifier.classify(runtime, candidate) {
                Classification::Unclaimed => continue,
                Classification::Claimed(mut file) => {
                    file.merge_attributes(
                        &crate::model::DiscoveryAttributes::default()
                            .with_classifier(classifier.name()),
                    );
                    return Classification::Claimed(file);
                }
                invalid @ Classification::Invalid(_) => return invalid,
            }
        }
        Classification::Unclaimed
    }
}

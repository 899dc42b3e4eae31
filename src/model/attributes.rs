use std::fmt;

use super::IdentityKey;

/// How a mod file was discovered: which locator found it, which classifier
/// produced it, which resolver extracted it, and the package it was pulled
/// out of. Re-discovering a file through a more specific route merges the
/// routes instead of replacing them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryAttributes {
    /// Identity of the package this file was extracted from, if any.
    pub parent: Option<IdentityKey>,
    pub classifier: Option<String>,
    pub locator: Option<String>,
    pub dependency_resolver: Option<String>,
    /// Supplied by the loading system itself rather than discovered.
    pub system: bool,
}

impl DiscoveryAttributes {
    pub fn with_parent(mut self, parent: IdentityKey) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
        self.locator = Some(locator.into());
        self
    }

    pub fn with_dependency_resolver(mut self, resolver: impl Into<String>) -> Self {
        self.dependency_resolver = Some(resolver.into());
        self
    }

    pub fn with_system(mut self, system: bool) -> Self {
        self.system = system;
        self
    }

    /// Associative merge: the first non-empty value per field wins and the
    /// system flag is ORed.
    pub fn merge(&self, other: &DiscoveryAttributes) -> DiscoveryAttributes {
        DiscoveryAttributes {
            parent: self.parent.clone().or_else(|| other.parent.clone()),
            classifier: self.classifier.clone().or_else(|| other.classifier.clone()),
            locator: self.locator.clone().or_else(|| other.locator.clone()),
            dependency_resolver: self
                .dependency_resolver
                .clone()
                .or_else(|| other.dependency_resolver.clone()),
            system: self.system || other.system,
        }
    }
}

impl fmt::Display for DiscoveryAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(parent) = &self.parent {
            parts.push(format!("parent: {parent}"));
        }
        if let Some(locator) = &self.locator {
            parts.push(format!("locator: {locator}"));
        }
        if let Some(classifier) = &self.classifier {
            parts.push(format!("classifier: {classifier}"));
        }
        if let Some(resolver) = &self.dependency_resolver {
            parts.push(format!("resolver: {resolver}"));
        }
        if self.system {
            parts.push("system".to_string());
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

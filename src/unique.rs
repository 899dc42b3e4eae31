//! Deduplication of the discovered mod-file set by identity.
//!
//! The same package can surface through several discovery routes. Files
//! sharing an identity and an equivalent classification collapse into one
//! entry with merged provenance; files sharing an identity but disagreeing
//! about what they are collide, and every member of the colliding group is
//! dropped.

use log::debug;
use std::collections::HashMap;

use crate::error::IdentityCollision;
use crate::model::{IdentityKey, ModFile};

pub struct UniqueListBuilder;

impl UniqueListBuilder {
    /// Collapse `files` into a unique list, preserving first-discovery order.
    /// Idempotent: feeding the output back in changes nothing.
    pub fn build(files: Vec<ModFile>) -> (Vec<ModFile>, Vec<IdentityCollision>) {
        let mut order: Vec<IdentityKey> = Vec::new();
        let mut groups: HashMap<IdentityKey, Vec<ModFile>> = HashMap::new();
        for file in files {
            let entry = groups.entry(file.identity().clone()).or_default();
            if entry.is_empty() {
                order.push(file.identity().clone());
            }
            entry.push(file);
        }

        let mut unique = Vec::new();
        let mut collisions = Vec::new();

        for identity in order {
            let group = groups.remove(&identity).unwrap_or_default();
            let (first, rest) = match group.split_first() {
                Some(split) => split,
                None => continue,
            };

            if rest.iter().all(|f| first.same_classification(f)) {
                let mut merged = first.clone();
                for duplicate in rest {
                    debug!(
                        "Merging duplicate discovery of {}: {}",
                        merged.file_name(),
                        duplicate.attributes
                    );
                    merged.merge_attributes(&duplicate.attributes);
                }
                unique.push(merged);
            } else {
                collisions.push(IdentityCollision {
                    identity: identity.to_string(),
                    paths: group
                        .iter()
                        .map(|f| f.contents.primary_path().to_path_buf())
                        .collect(),
                });
            }
        }

        (unique, collisions)
    }
}

// ── Domain model ──

mod identifier;
mod object;

pub use identifier::{ItemRevisionId, display_name};
pub use object::{ModelObject, ObjectPool, Property, object_pool, resolve_plain, service_data_pool};

use serde::Serialize;

/// Header information of a requirement specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Specification {
    pub uid: String,
    pub item_id: String,
    pub revision: String,
    pub name: String,
    pub description: String,
}

/// Flattened, pre-order view of a specification's structure.
///
/// The three sequences are aligned: entry `i` of each describes the same
/// node. Depth 0 marks the root's immediate children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpecContents {
    pub labels: Vec<String>,
    pub depths: Vec<usize>,
    pub locations: Vec<String>,
}

impl SpecContents {
    pub fn push(&mut self, label: impl Into<String>, depth: usize, location: impl Into<String>) {
        self.labels.push(label.into());
        self.depths.push(depth);
        self.locations.push(location.into());
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterate `(label, depth, location)` triples in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize, &str)> {
        self.labels
            .iter()
            .zip(&self.depths)
            .zip(&self.locations)
            .map(|((label, depth), location)| (label.as_str(), *depth, location.as_str()))
    }
}

//! Edge declarations between models.

use super::ModelDefinition;

/// Target of an edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelRef {
    /// A model referenced by name, resolved against the registry when compiled.
    Name(String),
    /// A model referenced directly, by its collection name.
    Collection(String),
}

/// A directed relationship from the declaring model to another model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeDef {
    /// Edge name (unique within the declaring model).
    pub name: String,
    /// Target model.
    pub to: ModelRef,
}

impl EdgeDef {
    /// Create an edge to a model referenced by name.
    pub fn to_named(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            to: ModelRef::Name(model.into()),
        }
    }

    /// Create an edge to a model referenced directly.
    pub fn to_model(name: impl Into<String>, model: &ModelDefinition) -> Self {
        Self {
            name: name.into(),
            to: ModelRef::Collection(model.collection()),
        }
    }
}

/// Derive the edge-collection name for an edge between two collections.
pub fn edge_collection_name(from: &str, to: &str) -> String {
    format!("{from}__{to}")
}

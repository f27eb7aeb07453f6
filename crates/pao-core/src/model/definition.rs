//! Model definitions.

use super::naming::default_collection_name;
use super::{DefinitionError, EdgeDef, FieldDef, IndexDef};
use serde::{Deserialize, Serialize};

/// When schema validation is applied by the database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Validation disabled.
    None,
    /// Only new documents are validated.
    New,
    /// New and already valid documents are validated.
    Moderate,
    /// Every insert and update is validated.
    #[default]
    Strict,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::None => write!(f, "none"),
            Level::New => write!(f, "new"),
            Level::Moderate => write!(f, "moderate"),
            Level::Strict => write!(f, "strict"),
        }
    }
}

/// Declarative description of one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDefinition {
    /// Model (type) name.
    pub name: String,
    /// Explicit collection name; derived from `name` when absent.
    pub collection_name: Option<String>,
    /// Validation strictness.
    pub level: Level,
    /// Whether undeclared properties are accepted.
    pub additional_properties: bool,
    /// Fields in declaration order.
    pub fields: Vec<FieldDef>,
    /// Model-level indexes in declaration order.
    pub indexes: Vec<IndexDef>,
    /// Outgoing edges in declaration order.
    pub edges: Vec<EdgeDef>,
}

impl ModelDefinition {
    /// Create a strict model without fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection_name: None,
            level: Level::default(),
            additional_properties: false,
            fields: Vec::new(),
            indexes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Set an explicit collection name.
    pub fn with_collection_name(mut self, collection: impl Into<String>) -> Self {
        self.collection_name = Some(collection.into());
        self
    }

    /// Set the validation level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Allow or forbid undeclared properties.
    pub fn with_additional_properties(mut self, allowed: bool) -> Self {
        self.additional_properties = allowed;
        self
    }

    /// Add a field, rejecting contradictory declarations.
    pub fn with_field(mut self, field: FieldDef) -> Result<Self, DefinitionError> {
        field.validate(&self.name)?;
        if self.field(&field.name).is_some() {
            return Err(DefinitionError::DuplicateField {
                model: self.name.clone(),
                field: field.name,
            });
        }
        if let Some(index) = &field.index_name {
            if self.index_taken(index) {
                return Err(DefinitionError::DuplicateIndex {
                    model: self.name.clone(),
                    index: index.clone(),
                });
            }
        }
        self.fields.push(field);
        Ok(self)
    }

    /// Add a model-level index, rejecting contradictory declarations.
    pub fn with_index(mut self, index: IndexDef) -> Result<Self, DefinitionError> {
        index.validate(&self.name)?;
        if self.index_taken(&index.name) {
            return Err(DefinitionError::DuplicateIndex {
                model: self.name.clone(),
                index: index.name,
            });
        }
        self.indexes.push(index);
        Ok(self)
    }

    /// Add an outgoing edge.
    pub fn with_edge(mut self, edge: EdgeDef) -> Result<Self, DefinitionError> {
        if self.edges.iter().any(|e| e.name == edge.name) {
            return Err(DefinitionError::DuplicateEdge {
                model: self.name.clone(),
                edge: edge.name,
            });
        }
        self.edges.push(edge);
        Ok(self)
    }

    /// The collection backing this model.
    pub fn collection(&self) -> String {
        match &self.collection_name {
            Some(name) => name.clone(),
            None => default_collection_name(&self.name),
        }
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn index_taken(&self, name: &str) -> bool {
        self.indexes.iter().any(|i| i.name == name)
            || self
                .fields
                .iter()
                .any(|f| f.index_name.as_deref() == Some(name))
    }
}

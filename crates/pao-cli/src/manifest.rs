//! JSON model manifest.
//!
//! The CLI has no compiled-in models, so it reads them from a manifest and
//! registers each one through the declaration API:
//!
//! ```json
//! {
//!   "models": [
//!     {
//!       "name": "UserModel",
//!       "level": "strict",
//!       "fields": [
//!         {"name": "email", "type": "string", "index": "email_idx", "unique": true, "required": true},
//!         {"name": "tags", "type": "array", "items": "string"}
//!       ],
//!       "indexes": [{"name": "seen_ttl", "type": "ttl", "fields": ["seen_at"], "expiry_seconds": 3600}],
//!       "edges": [{"name": "groups", "to": "GroupModel"}]
//!     }
//!   ]
//! }
//! ```

use crate::error::CliError;
use pao_core::{
    EdgeDef, ElementType, FieldDef, FieldType, IndexDef, IndexFields, IndexKind, Level,
    ModelDefinition, ModelRef, ModelRegistry,
};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    models: Vec<ManifestModel>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestModel {
    name: String,
    #[serde(default)]
    collection: Option<String>,
    #[serde(default)]
    level: Level,
    #[serde(default)]
    additional_properties: bool,
    #[serde(default)]
    fields: Vec<ManifestField>,
    #[serde(default)]
    indexes: Vec<ManifestIndex>,
    #[serde(default)]
    edges: Vec<ManifestEdge>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ManifestFieldType {
    Int,
    Float,
    String,
    Array,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestField {
    name: String,
    #[serde(rename = "type")]
    field_type: ManifestFieldType,
    #[serde(default)]
    items: Option<ElementType>,
    #[serde(default)]
    index: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    unique: bool,
    #[serde(default)]
    minimum: Option<f64>,
    #[serde(default)]
    maximum: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestIndex {
    name: String,
    #[serde(rename = "type")]
    kind: IndexKind,
    fields: IndexFields,
    #[serde(default)]
    unique: bool,
    #[serde(default)]
    expiry_seconds: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestEdge {
    name: String,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    to_collection: Option<String>,
}

/// Read a manifest file into a registry.
pub fn load_registry(path: &Path) -> Result<ModelRegistry, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::ManifestIo {
        path: path.to_path_buf(),
        source,
    })?;
    let registry = parse_registry(&text)?;
    debug!(path = %path.display(), models = registry.len(), "model manifest loaded");
    Ok(registry)
}

/// Parse manifest text into a registry, in manifest order.
pub fn parse_registry(text: &str) -> Result<ModelRegistry, CliError> {
    let manifest: Manifest =
        serde_json::from_str(text).map_err(|e| CliError::Manifest(e.to_string()))?;

    let mut registry = ModelRegistry::new();
    for model in manifest.models {
        registry.register(model.into_definition()?)?;
    }
    Ok(registry)
}

impl ManifestModel {
    fn into_definition(self) -> Result<ModelDefinition, CliError> {
        let mut definition = ModelDefinition::new(&self.name)
            .with_level(self.level)
            .with_additional_properties(self.additional_properties);
        if let Some(collection) = self.collection {
            definition = definition.with_collection_name(collection);
        }

        for field in self.fields {
            definition = definition.with_field(field.into_field(&self.name)?)?;
        }
        for index in self.indexes {
            let mut def = IndexDef::new(index.name, index.kind, index.fields);
            if index.unique {
                def = def.unique();
            }
            if let Some(expiry) = index.expiry_seconds {
                def = def.with_expiry(expiry);
            }
            definition = definition.with_index(def)?;
        }
        for edge in self.edges {
            let to = match (edge.to, edge.to_collection) {
                (Some(model), None) => ModelRef::Name(model),
                (None, Some(collection)) => ModelRef::Collection(collection),
                _ => {
                    return Err(CliError::Manifest(format!(
                        "edge '{}' on model '{}' needs exactly one of 'to' or 'to_collection'",
                        edge.name, self.name
                    )));
                }
            };
            definition = definition.with_edge(EdgeDef {
                name: edge.name,
                to,
            })?;
        }

        Ok(definition)
    }
}

impl ManifestField {
    fn into_field(self, model: &str) -> Result<FieldDef, CliError> {
        let field_type = match (self.field_type, self.items) {
            (ManifestFieldType::Int, None) => FieldType::Int,
            (ManifestFieldType::Float, None) => FieldType::Float,
            (ManifestFieldType::String, None) => FieldType::String,
            (ManifestFieldType::Array, Some(element)) => FieldType::Array(element),
            (ManifestFieldType::Array, None) => {
                return Err(CliError::Manifest(format!(
                    "array field '{model}.{}' needs 'items'",
                    self.name
                )));
            }
            (_, Some(_)) => {
                return Err(CliError::Manifest(format!(
                    "'items' is only valid on array fields ('{model}.{}')",
                    self.name
                )));
            }
        };

        let mut field = FieldDef::new(self.name, field_type);
        if let Some(index) = self.index {
            field = field.with_index(index);
        }
        if self.required {
            field = field.required();
        }
        if self.unique {
            field = field.unique();
        }
        if let Some(minimum) = self.minimum {
            field = field.with_minimum(minimum);
        }
        if let Some(maximum) = self.maximum {
            field = field.with_maximum(maximum);
        }
        Ok(field)
    }
}

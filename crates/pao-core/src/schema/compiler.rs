//! Schema compiler: model definition in, collection description out.

use super::{CollectionSchema, EdgeDefinition, IndexSpec, PropertySchema, SchemaRule};
use crate::model::{edge_collection_name, DefinitionError, ModelDefinition, ModelRef, ModelRegistry};
use std::collections::BTreeMap;

/// Everything the migration builder needs to know about one model.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSchema {
    /// Collection name.
    pub collection: String,
    /// Validation schema document.
    pub schema: CollectionSchema,
    /// Hash indexes declared on fields.
    pub field_indexes: Vec<IndexSpec>,
    /// Indexes declared at model level.
    pub other_indexes: Vec<IndexSpec>,
    /// Outgoing edge collections.
    pub edges: Vec<EdgeDefinition>,
}

impl CompiledSchema {
    /// Field indexes followed by model-level indexes.
    pub fn indexes(&self) -> impl Iterator<Item = &IndexSpec> {
        self.field_indexes.iter().chain(self.other_indexes.iter())
    }
}

/// Pure translation of model declarations.
pub struct SchemaCompiler;

impl SchemaCompiler {
    /// Compile one model. `registry` resolves edges that name their target.
    pub fn compile(
        model: &ModelDefinition,
        registry: &ModelRegistry,
    ) -> Result<CompiledSchema, DefinitionError> {
        let collection = model.collection();

        let mut properties = BTreeMap::new();
        let mut required = Vec::new();
        let mut field_indexes = Vec::new();

        for field in &model.fields {
            properties.insert(field.name.clone(), PropertySchema::for_field(field));
            if field.required {
                required.push(field.name.clone());
            }
            if field.is_indexed() {
                // Declaration validation guarantees unique fields carry a name.
                let name = field.index_name.clone().ok_or_else(|| {
                    DefinitionError::UniqueWithoutIndex {
                        model: model.name.clone(),
                        field: field.name.clone(),
                    }
                })?;
                field_indexes.push(IndexSpec::field_hash(name, &field.name, field.unique));
            }
        }

        let schema = CollectionSchema {
            rule: SchemaRule {
                properties,
                additional_properties: model.additional_properties,
                required,
            },
            level: model.level,
        };

        let other_indexes = model.indexes.iter().map(IndexSpec::from).collect();

        let mut edges = Vec::with_capacity(model.edges.len());
        for edge in &model.edges {
            let target = match &edge.to {
                ModelRef::Collection(name) => name.clone(),
                ModelRef::Name(name) => registry
                    .get(name)
                    .map(ModelDefinition::collection)
                    .ok_or_else(|| DefinitionError::UnresolvedEdgeTarget {
                        model: model.name.clone(),
                        edge: edge.name.clone(),
                        target: name.clone(),
                    })?,
            };
            edges.push(EdgeDefinition {
                edge_collection: edge_collection_name(&collection, &target),
                from_vertex_collections: vec![collection.clone()],
                to_vertex_collections: vec![target],
            });
        }

        Ok(CompiledSchema {
            collection,
            schema,
            field_indexes,
            other_indexes,
            edges,
        })
    }
}

//! Validation schema and index documents.
//!
//! The JSON shape of these types is what artifacts persist and what the
//! database receives, so field order and naming are part of the format.

use crate::model::{ElementType, FieldDef, FieldType, IndexDef, IndexFields, IndexKind, Level};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Backend type of a schema property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    /// Any JSON number.
    Number,
    /// JSON string.
    String,
    /// JSON array.
    Array,
}

/// Validation rule for one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySchema {
    /// Backend type.
    #[serde(rename = "type")]
    pub json_type: JsonType,
    /// Numbers must be a multiple of this value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<u64>,
    /// Minimum numeric value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// Maximum numeric value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    /// Minimum string length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    /// Maximum string length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    /// Rule applied to each array element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertySchema>>,
}

impl PropertySchema {
    fn bare(json_type: JsonType) -> Self {
        Self {
            json_type,
            multiple_of: None,
            minimum: None,
            maximum: None,
            min_length: None,
            max_length: None,
            items: None,
        }
    }

    fn scalar(element: ElementType, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        match element {
            ElementType::Int => Self {
                multiple_of: Some(1),
                minimum,
                maximum,
                ..Self::bare(JsonType::Number)
            },
            ElementType::Float => Self {
                minimum,
                maximum,
                ..Self::bare(JsonType::Number)
            },
            ElementType::String => Self {
                min_length: minimum.map(|v| v as u64),
                max_length: maximum.map(|v| v as u64),
                ..Self::bare(JsonType::String)
            },
        }
    }

    /// Map a field declaration to its validation rule.
    pub fn for_field(field: &FieldDef) -> Self {
        match field.field_type {
            FieldType::Int => Self::scalar(ElementType::Int, field.minimum, field.maximum),
            FieldType::Float => Self::scalar(ElementType::Float, field.minimum, field.maximum),
            FieldType::String => Self::scalar(ElementType::String, field.minimum, field.maximum),
            FieldType::Array(element) => Self {
                items: Some(Box::new(Self::scalar(element, field.minimum, field.maximum))),
                ..Self::bare(JsonType::Array)
            },
        }
    }
}

/// The `rule` part of a collection schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRule {
    /// Property rules keyed by field name.
    pub properties: BTreeMap<String, PropertySchema>,
    /// Whether undeclared properties are accepted.
    #[serde(rename = "additionalProperties")]
    pub additional_properties: bool,
    /// Fields that must be present.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

/// Validation schema attached to a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    /// Validation rule.
    pub rule: SchemaRule,
    /// When validation is enforced.
    pub level: Level,
}

/// A typed index as created on a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Index name.
    pub name: String,
    /// Index kind.
    #[serde(rename = "type")]
    pub kind: IndexKind,
    /// Covered fields.
    pub fields: IndexFields,
    /// Whether indexed values must be unique.
    #[serde(default)]
    pub unique: bool,
    /// Expiry in seconds (ttl indexes only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_seconds: Option<u64>,
}

impl IndexSpec {
    /// Hash index over a single field.
    pub fn field_hash(name: impl Into<String>, field: impl Into<String>, unique: bool) -> Self {
        Self {
            name: name.into(),
            kind: IndexKind::Hash,
            fields: IndexFields::List(vec![field.into()]),
            unique,
            expiry_seconds: None,
        }
    }
}

impl From<&IndexDef> for IndexSpec {
    fn from(index: &IndexDef) -> Self {
        Self {
            name: index.name.clone(),
            kind: index.kind,
            fields: index.fields.clone(),
            unique: index.unique,
            expiry_seconds: index.expiry_seconds,
        }
    }
}

/// An edge collection and the vertex collections it connects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDefinition {
    /// Edge collection name.
    pub edge_collection: String,
    /// Source vertex collections.
    pub from_vertex_collections: Vec<String>,
    /// Target vertex collections.
    pub to_vertex_collections: Vec<String>,
}

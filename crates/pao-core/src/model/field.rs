//! Field declarations.

use super::DefinitionError;
use serde::{Deserialize, Serialize};

/// Element type of an array field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// Integral number.
    Int,
    /// Floating point number.
    Float,
    /// String.
    String,
}

/// Semantic type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Integral number.
    Int,
    /// Floating point number.
    Float,
    /// String; bounds apply to its length.
    String,
    /// Array of scalar elements; bounds apply to each element.
    Array(ElementType),
}

impl FieldType {
    /// Whether bounds on this type describe a length rather than a value.
    pub fn has_length_bounds(&self) -> bool {
        matches!(
            self,
            FieldType::String | FieldType::Array(ElementType::String)
        )
    }
}

/// A field declaration within a model.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Field semantic type.
    pub field_type: FieldType,
    /// Name of the hash index built on this field, if any.
    pub index_name: Option<String>,
    /// Whether the field must be present in every document.
    pub required: bool,
    /// Whether values must be unique (requires an index name).
    pub unique: bool,
    /// Lower bound (value, or length for strings).
    pub minimum: Option<f64>,
    /// Upper bound (value, or length for strings).
    pub maximum: Option<f64>,
}

impl FieldDef {
    /// Create an optional, unindexed field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            index_name: None,
            required: false,
            unique: false,
            minimum: None,
            maximum: None,
        }
    }

    /// Create an integer field.
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Int)
    }

    /// Create a float field.
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Float)
    }

    /// Create a string field.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    /// Create an array field.
    pub fn array(name: impl Into<String>, element: ElementType) -> Self {
        Self::new(name, FieldType::Array(element))
    }

    /// Build a named hash index on this field.
    pub fn with_index(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    /// Mark as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark as unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Set the lower bound.
    pub fn with_minimum(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    /// Set the upper bound.
    pub fn with_maximum(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    /// Whether this field contributes a field-level index.
    pub fn is_indexed(&self) -> bool {
        self.index_name.is_some() || self.unique
    }

    /// Check the declaration for contradictions.
    pub fn validate(&self, model: &str) -> Result<(), DefinitionError> {
        if self.unique && self.index_name.is_none() {
            return Err(DefinitionError::UniqueWithoutIndex {
                model: model.to_string(),
                field: self.name.clone(),
            });
        }

        if self.is_indexed() && matches!(self.field_type, FieldType::Array(_)) {
            return Err(DefinitionError::InvalidFieldIndex {
                model: model.to_string(),
                field: self.name.clone(),
            });
        }

        let invalid = |reason: &str| DefinitionError::InvalidBounds {
            model: model.to_string(),
            field: self.name.clone(),
            reason: reason.to_string(),
        };

        if let (Some(min), Some(max)) = (self.minimum, self.maximum) {
            if min > max {
                return Err(invalid("minimum is greater than maximum"));
            }
        }

        if self.field_type.has_length_bounds() {
            for bound in [self.minimum, self.maximum].into_iter().flatten() {
                if bound < 0.0 || bound.fract() != 0.0 {
                    return Err(invalid("length bounds must be non-negative integers"));
                }
            }
        }

        Ok(())
    }
}

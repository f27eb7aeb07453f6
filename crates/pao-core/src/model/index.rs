//! Index declarations.

use super::DefinitionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of a database index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Hash index over one or more fields.
    Hash,
    /// Inverted (full-text) index.
    Inverted,
    /// Geo-spatial index.
    Geo,
    /// Time-to-live index.
    Ttl,
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexKind::Hash => write!(f, "hash"),
            IndexKind::Inverted => write!(f, "inverted"),
            IndexKind::Geo => write!(f, "geo"),
            IndexKind::Ttl => write!(f, "ttl"),
        }
    }
}

/// Fields covered by an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexFields {
    /// Plain list of field names.
    List(Vec<String>),
    /// Field names mapped to per-field options (inverted indexes).
    Options(BTreeMap<String, serde_json::Value>),
}

impl IndexFields {
    /// Number of covered fields.
    pub fn len(&self) -> usize {
        match self {
            IndexFields::List(fields) => fields.len(),
            IndexFields::Options(fields) => fields.len(),
        }
    }

    /// Whether no field is covered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Covered field names in order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            IndexFields::List(fields) => fields.iter().map(String::as_str).collect(),
            IndexFields::Options(fields) => fields.keys().map(String::as_str).collect(),
        }
    }
}

impl From<Vec<String>> for IndexFields {
    fn from(fields: Vec<String>) -> Self {
        IndexFields::List(fields)
    }
}

impl From<&[&str]> for IndexFields {
    fn from(fields: &[&str]) -> Self {
        IndexFields::List(fields.iter().map(|f| f.to_string()).collect())
    }
}

/// A model-level index declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDef {
    /// Index name.
    pub name: String,
    /// Index kind.
    pub kind: IndexKind,
    /// Covered fields.
    pub fields: IndexFields,
    /// Whether indexed values must be unique.
    pub unique: bool,
    /// Expiry in seconds (ttl indexes only).
    pub expiry_seconds: Option<u64>,
}

impl IndexDef {
    /// Create an index declaration.
    pub fn new(name: impl Into<String>, kind: IndexKind, fields: impl Into<IndexFields>) -> Self {
        Self {
            name: name.into(),
            kind,
            fields: fields.into(),
            unique: false,
            expiry_seconds: None,
        }
    }

    /// Create a hash index.
    pub fn hash(name: impl Into<String>, fields: impl Into<IndexFields>) -> Self {
        Self::new(name, IndexKind::Hash, fields)
    }

    /// Create a geo index.
    pub fn geo(name: impl Into<String>, fields: impl Into<IndexFields>) -> Self {
        Self::new(name, IndexKind::Geo, fields)
    }

    /// Create an inverted index from a field-to-options mapping.
    pub fn inverted(
        name: impl Into<String>,
        fields: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        Self::new(name, IndexKind::Inverted, IndexFields::Options(fields))
    }

    /// Create a ttl index expiring after the given number of seconds.
    pub fn ttl(name: impl Into<String>, fields: impl Into<IndexFields>, expiry_seconds: u64) -> Self {
        Self::new(name, IndexKind::Ttl, fields).with_expiry(expiry_seconds)
    }

    /// Mark as unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Set the expiry duration.
    pub fn with_expiry(mut self, expiry_seconds: u64) -> Self {
        self.expiry_seconds = Some(expiry_seconds);
        self
    }

    /// Check the declaration for contradictions.
    pub fn validate(&self, model: &str) -> Result<(), DefinitionError> {
        if self.fields.is_empty() {
            return Err(DefinitionError::EmptyIndex {
                model: model.to_string(),
                index: self.name.clone(),
            });
        }

        match self.kind {
            IndexKind::Inverted => {
                let is_mapping = matches!(self.fields, IndexFields::Options(_));
                if !is_mapping || self.fields.len() < 2 {
                    return Err(DefinitionError::InvalidInvertedIndex {
                        model: model.to_string(),
                        index: self.name.clone(),
                    });
                }
            }
            IndexKind::Ttl if self.expiry_seconds.is_none() => {
                return Err(DefinitionError::MissingExpiry {
                    model: model.to_string(),
                    index: self.name.clone(),
                });
            }
            _ => {}
        }

        Ok(())
    }
}

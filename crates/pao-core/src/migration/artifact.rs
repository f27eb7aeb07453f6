//! Migration artifacts and their names.

use super::{MigrationError, Operation};
use crate::schema::{CompiledSchema, EdgeDefinition};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A persisted migration unit: an apply directive and a revert directive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Operations run by `up`, in order.
    pub up: Vec<Operation>,
    /// Operations run by `down`, in order.
    pub down: Vec<Operation>,
}

impl Artifact {
    /// Artifact creating a collection with its schema and indexes.
    pub fn create_collection(compiled: &CompiledSchema) -> Self {
        let mut up = vec![Operation::CreateCollection {
            collection: compiled.collection.clone(),
            schema: compiled.schema.clone(),
        }];
        up.extend(Self::add_indexes(compiled));

        Self {
            up,
            down: vec![Self::drop_collection(compiled)],
        }
    }

    /// Artifact reconfiguring an existing collection and rebuilding its indexes.
    ///
    /// The revert directive drops the whole collection.
    pub fn update_collection(compiled: &CompiledSchema) -> Self {
        let mut up = vec![
            Operation::ConfigureCollection {
                collection: compiled.collection.clone(),
                schema: compiled.schema.clone(),
            },
            Operation::DropIndexes {
                collection: compiled.collection.clone(),
            },
        ];
        up.extend(Self::add_indexes(compiled));

        Self {
            up,
            down: vec![Self::drop_collection(compiled)],
        }
    }

    /// Artifact (re)creating the named graph over the given edge collections.
    pub fn graph(name: &str, edges: Vec<EdgeDefinition>) -> Self {
        Self {
            up: vec![
                Operation::DropGraph {
                    graph: name.to_string(),
                    ignore_missing: true,
                },
                Operation::CreateGraph {
                    graph: name.to_string(),
                    edge_definitions: edges,
                },
            ],
            down: vec![Operation::DropGraph {
                graph: name.to_string(),
                ignore_missing: true,
            }],
        }
    }

    /// Artifact with empty directives, to be filled in by hand.
    pub fn blank() -> Self {
        Self::default()
    }

    /// Render the artifact as stored on disk.
    pub fn render(&self) -> Result<String, serde_json::Error> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }

    /// Parse stored artifact text.
    pub fn parse(name: &ArtifactName, text: &str) -> Result<Self, MigrationError> {
        serde_json::from_str(text).map_err(|source| MigrationError::InvalidArtifact {
            name: name.to_string(),
            source,
        })
    }

    fn add_indexes(compiled: &CompiledSchema) -> impl Iterator<Item = Operation> + '_ {
        compiled.indexes().map(|index| Operation::AddIndex {
            collection: compiled.collection.clone(),
            index: index.clone(),
        })
    }

    fn drop_collection(compiled: &CompiledSchema) -> Operation {
        Operation::DropCollection {
            collection: compiled.collection.clone(),
            ignore_missing: true,
        }
    }
}

/// Artifact identity: `NNNN_<suffix>`.
///
/// Ordering is by ordinal then suffix, which matches filename order for
/// zero-padded ordinals.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArtifactName {
    /// Sequence number defining apply order.
    pub ordinal: u32,
    /// Target collection or graph name, or a free-form label.
    pub suffix: String,
}

impl ArtifactName {
    /// Create a name.
    pub fn new(ordinal: u32, suffix: impl Into<String>) -> Self {
        Self {
            ordinal,
            suffix: suffix.into(),
        }
    }

    /// Parse a name, splitting on the first `_`.
    ///
    /// Only canonical names are accepted: at least four digits, no extra
    /// leading zeros, and a non-empty suffix.
    pub fn parse(name: &str) -> Option<Self> {
        let (prefix, suffix) = name.split_once('_')?;
        if suffix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let parsed = Self::new(prefix.parse().ok()?, suffix);
        (parsed.to_string() == name).then_some(parsed)
    }

    /// File name of the artifact in a store.
    pub fn file_name(&self) -> String {
        format!("{self}.json")
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}_{}", self.ordinal, self.suffix)
    }
}

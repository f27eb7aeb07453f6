//! Storage boundary for PAO.
//!
//! Migrations talk to the database only through the [`Database`] trait. The
//! crate ships [`SledDatabase`], an embedded document/graph store on sled.

mod config;
mod engine;
mod query;
mod validator;

pub use config::StorageConfig;
pub use engine::SledDatabase;
pub use query::{compare_values, Cursor, DocumentQuery, Filter, SortKey, SortOrder};
pub use validator::validate_document;

use crate::error::Error;
use crate::schema::{CollectionSchema, EdgeDefinition, IndexSpec};
use serde::{Deserialize, Serialize};

/// A stored document.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Kind of collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// Regular document collection.
    Document,
    /// Edge collection connecting vertices.
    Edge,
}

/// Metadata describing one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    /// Collection name.
    pub name: String,
    /// Collection kind.
    pub kind: CollectionKind,
    /// Validation schema, if configured.
    pub schema: Option<CollectionSchema>,
    /// Secondary indexes.
    pub indexes: Vec<IndexSpec>,
}

/// Operations the migration engine needs from a database.
pub trait Database {
    /// Check whether a collection exists.
    fn has_collection(&self, name: &str) -> Result<bool, Error>;

    /// List all collections.
    fn collections(&self) -> Result<Vec<CollectionInfo>, Error>;

    /// Create a collection. Fails with [`Error::CollectionExists`] if present.
    fn create_collection(
        &self,
        name: &str,
        kind: CollectionKind,
        schema: Option<&CollectionSchema>,
    ) -> Result<(), Error>;

    /// Replace the validation schema of an existing collection.
    fn configure_schema(&self, name: &str, schema: &CollectionSchema) -> Result<(), Error>;

    /// Drop a collection and its documents. Returns whether it existed.
    fn drop_collection(&self, name: &str, ignore_missing: bool) -> Result<bool, Error>;

    /// List secondary indexes of a collection.
    fn indexes(&self, collection: &str) -> Result<Vec<IndexSpec>, Error>;

    /// Add an index. Adding an identical existing index is a no-op.
    fn add_index(&self, collection: &str, index: &IndexSpec) -> Result<IndexSpec, Error>;

    /// Delete an index by name. Returns whether it existed.
    fn delete_index(&self, collection: &str, name: &str, ignore_missing: bool)
        -> Result<bool, Error>;

    /// Check whether a named graph exists.
    fn has_graph(&self, name: &str) -> Result<bool, Error>;

    /// Create a named graph from edge definitions.
    fn create_graph(&self, name: &str, edges: &[EdgeDefinition]) -> Result<(), Error>;

    /// Drop a named graph, keeping its collections. Returns whether it existed.
    fn drop_graph(&self, name: &str, ignore_missing: bool) -> Result<bool, Error>;

    /// Run a parameterized document query.
    fn query(&self, query: &DocumentQuery) -> Result<Cursor, Error>;

    /// Insert one document and return it as stored.
    fn insert(&self, collection: &str, document: Document) -> Result<Document, Error>;

    /// Remove a document by key. Returns whether it existed.
    fn remove(&self, collection: &str, key: &str) -> Result<bool, Error>;
}

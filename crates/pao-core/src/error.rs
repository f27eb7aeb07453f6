//! Core error types.

use thiserror::Error;

/// Database boundary errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Filesystem error while preparing the database directory.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The collection (or query target) does not exist.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// A collection with this name already exists.
    #[error("collection already exists: {0}")]
    CollectionExists(String),

    /// The graph does not exist.
    #[error("graph not found: {0}")]
    GraphNotFound(String),

    /// The index does not exist on the collection.
    #[error("index {name} not found on collection {collection}")]
    IndexNotFound {
        /// Collection name.
        collection: String,
        /// Index name.
        name: String,
    },

    /// An index with the same name but a different definition exists.
    #[error("index {name} on collection {collection} already exists with a different definition")]
    IndexConflict {
        /// Collection name.
        collection: String,
        /// Index name.
        name: String,
    },

    /// A document does not satisfy the collection schema.
    #[error("schema violation in {collection}: {message}")]
    SchemaViolation {
        /// Collection name.
        collection: String,
        /// Description of the violation.
        message: String,
    },

    /// A unique index already holds the value.
    #[error("unique constraint {index} violated in {collection}: {value}")]
    UniqueViolation {
        /// Collection name.
        collection: String,
        /// Index name.
        index: String,
        /// The duplicated value.
        value: String,
    },

    /// Invalid data format.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    /// Whether the error reports a missing collection or query target.
    pub fn is_collection_not_found(&self) -> bool {
        matches!(self, Error::CollectionNotFound(_))
    }
}

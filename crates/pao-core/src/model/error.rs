//! Definition errors raised while declaring or compiling models.

use thiserror::Error;

/// A contradiction in a model, field, index, or edge declaration.
///
/// These are never retried: they surface before anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// A unique field was declared without an index name.
    #[error("unique attribute requires an index name for field {model}.{field}")]
    UniqueWithoutIndex {
        /// Model name.
        model: String,
        /// Field name.
        field: String,
    },

    /// Array fields cannot carry a field-level index.
    #[error("field {model}.{field} cannot be indexed: array fields do not support field indexes")]
    InvalidFieldIndex {
        /// Model name.
        model: String,
        /// Field name.
        field: String,
    },

    /// Bounds on a field are contradictory or meaningless for its type.
    #[error("invalid bounds for field {model}.{field}: {reason}")]
    InvalidBounds {
        /// Model name.
        model: String,
        /// Field name.
        field: String,
        /// Why the bounds were rejected.
        reason: String,
    },

    /// Inverted indexes need a mapping of at least two fields.
    #[error("inverted index {index} on {model} must have at least 2 fields given as a field-to-options mapping")]
    InvalidInvertedIndex {
        /// Model name.
        model: String,
        /// Index name.
        index: String,
    },

    /// TTL indexes need an expiry duration.
    #[error("ttl index {index} on {model} must have an expiry duration")]
    MissingExpiry {
        /// Model name.
        model: String,
        /// Index name.
        index: String,
    },

    /// An index was declared without any field.
    #[error("index {index} on {model} has no fields")]
    EmptyIndex {
        /// Model name.
        model: String,
        /// Index name.
        index: String,
    },

    /// Two fields share a name within one model.
    #[error("duplicate field {field} in model {model}")]
    DuplicateField {
        /// Model name.
        model: String,
        /// Field name.
        field: String,
    },

    /// Two indexes share a name within one model.
    #[error("duplicate index {index} in model {model}")]
    DuplicateIndex {
        /// Model name.
        model: String,
        /// Index name.
        index: String,
    },

    /// Two edges share a name within one model.
    #[error("duplicate edge {edge} in model {model}")]
    DuplicateEdge {
        /// Model name.
        model: String,
        /// Edge name.
        edge: String,
    },

    /// Two registered models share a name.
    #[error("model {0} is already registered")]
    DuplicateModel(String),

    /// Two registered models resolve to the same collection.
    #[error("collection {collection} of model {model} is already used by model {existing}")]
    DuplicateCollection {
        /// Collection name.
        collection: String,
        /// Model being registered.
        model: String,
        /// Model already owning the collection.
        existing: String,
    },

    /// A model claims the reserved bookkeeping collection.
    #[error("collection {collection} of model {model} is reserved")]
    ReservedCollection {
        /// Collection name.
        collection: String,
        /// Model name.
        model: String,
    },

    /// A model or collection name is empty.
    #[error("model name and collection name must not be empty")]
    EmptyName,

    /// An edge refers to a model name absent from the registry.
    #[error("edge {edge} of model {model} refers to unknown model {target}")]
    UnresolvedEdgeTarget {
        /// Model declaring the edge.
        model: String,
        /// Edge name.
        edge: String,
        /// Unresolved target model name.
        target: String,
    },
}

//! Database operations recorded in migration artifacts.

use crate::error::Error;
use crate::schema::{CollectionSchema, EdgeDefinition, IndexSpec};
use crate::storage::{CollectionKind, Database};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// One step of an apply or revert directive.
///
/// Applying an operation against a target that is already in the requested
/// state is reconciled rather than rejected, so that an artifact applied but
/// not recorded in the ledger can be applied again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Create a document collection with a validation schema.
    CreateCollection {
        /// Collection name.
        collection: String,
        /// Validation schema.
        schema: CollectionSchema,
    },
    /// Replace the validation schema of an existing collection.
    ConfigureCollection {
        /// Collection name.
        collection: String,
        /// Validation schema.
        schema: CollectionSchema,
    },
    /// Delete every index currently defined on a collection.
    DropIndexes {
        /// Collection name.
        collection: String,
    },
    /// Add one index.
    AddIndex {
        /// Collection name.
        collection: String,
        /// Index definition.
        index: IndexSpec,
    },
    /// Delete one index by name.
    DeleteIndex {
        /// Collection name.
        collection: String,
        /// Index name.
        name: String,
        /// Succeed if the index does not exist.
        #[serde(default)]
        ignore_missing: bool,
    },
    /// Drop a collection and its documents.
    DropCollection {
        /// Collection name.
        collection: String,
        /// Succeed if the collection does not exist.
        #[serde(default)]
        ignore_missing: bool,
    },
    /// Create a named graph.
    CreateGraph {
        /// Graph name.
        graph: String,
        /// Edge collections and the vertex collections they connect.
        edge_definitions: Vec<EdgeDefinition>,
    },
    /// Drop a named graph, keeping its collections.
    DropGraph {
        /// Graph name.
        graph: String,
        /// Succeed if the graph does not exist.
        #[serde(default)]
        ignore_missing: bool,
    },
}

impl Operation {
    /// Execute this operation against a database.
    pub fn apply(&self, db: &dyn Database) -> Result<(), Error> {
        debug!(operation = %self, "applying operation");

        match self {
            Operation::CreateCollection { collection, schema } => {
                if db.has_collection(collection)? {
                    warn!(collection = %collection, "collection already exists, reconfiguring schema");
                    db.configure_schema(collection, schema)
                } else {
                    db.create_collection(collection, CollectionKind::Document, Some(schema))
                }
            }
            Operation::ConfigureCollection { collection, schema } => {
                if db.has_collection(collection)? {
                    db.configure_schema(collection, schema)
                } else {
                    warn!(collection = %collection, "collection missing, creating it");
                    db.create_collection(collection, CollectionKind::Document, Some(schema))
                }
            }
            Operation::DropIndexes { collection } => {
                for index in db.indexes(collection)? {
                    db.delete_index(collection, &index.name, true)?;
                }
                Ok(())
            }
            Operation::AddIndex { collection, index } => match db.add_index(collection, index) {
                Ok(_) => Ok(()),
                Err(Error::IndexConflict { .. }) => {
                    warn!(
                        collection = %collection,
                        index = %index.name,
                        "index exists with a different definition, replacing it"
                    );
                    db.delete_index(collection, &index.name, true)?;
                    db.add_index(collection, index).map(|_| ())
                }
                Err(e) => Err(e),
            },
            Operation::DeleteIndex {
                collection,
                name,
                ignore_missing,
            } => db.delete_index(collection, name, *ignore_missing).map(|_| ()),
            Operation::DropCollection {
                collection,
                ignore_missing,
            } => db.drop_collection(collection, *ignore_missing).map(|_| ()),
            Operation::CreateGraph {
                graph,
                edge_definitions,
            } => {
                if db.has_graph(graph)? {
                    warn!(graph = %graph, "graph already exists, replacing it");
                    db.drop_graph(graph, true)?;
                }
                db.create_graph(graph, edge_definitions)
            }
            Operation::DropGraph {
                graph,
                ignore_missing,
            } => db.drop_graph(graph, *ignore_missing).map(|_| ()),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateCollection { collection, .. } => {
                write!(f, "create collection '{collection}'")
            }
            Operation::ConfigureCollection { collection, .. } => {
                write!(f, "configure collection '{collection}'")
            }
            Operation::DropIndexes { collection } => write!(f, "drop indexes of '{collection}'"),
            Operation::AddIndex { collection, index } => {
                write!(f, "add {} index '{}' on '{collection}'", index.kind, index.name)
            }
            Operation::DeleteIndex {
                collection, name, ..
            } => write!(f, "delete index '{name}' on '{collection}'"),
            Operation::DropCollection { collection, .. } => {
                write!(f, "drop collection '{collection}'")
            }
            Operation::CreateGraph { graph, .. } => write!(f, "create graph '{graph}'"),
            Operation::DropGraph { graph, .. } => write!(f, "drop graph '{graph}'"),
        }
    }
}

//! Migration-specific error types.

use crate::model::DefinitionError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building, applying or reverting migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A model declaration is invalid; nothing was written.
    #[error("definition error: {0}")]
    Definition(#[from] DefinitionError),

    /// Builder or migrator configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem error on the artifact store.
    #[error("io error on {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An artifact file does not parse.
    #[error("invalid artifact {name}: {source}")]
    InvalidArtifact {
        /// Artifact name.
        name: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A ledger entry refers to an artifact that is not in the store.
    #[error("artifact not found: {name}")]
    ArtifactNotFound {
        /// Artifact name.
        name: String,
    },

    /// Serialization error while rendering an artifact or ledger entry.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The apply directive of an artifact failed.
    #[error("applying {artifact} failed: {source}")]
    ApplyFailed {
        /// Artifact name.
        artifact: String,
        /// Database error.
        #[source]
        source: crate::error::Error,
    },

    /// The revert directive of an artifact failed.
    #[error("reverting {artifact} failed: {source}")]
    RevertFailed {
        /// Artifact name.
        artifact: String,
        /// Database error.
        #[source]
        source: crate::error::Error,
    },

    /// The ledger collection does not exist yet.
    #[error("migration ledger is unavailable: {0}")]
    LedgerUnavailable(String),

    /// A stored ledger document is malformed.
    #[error("invalid ledger entry: {0}")]
    InvalidLedgerEntry(String),

    /// Database error outside of a directive.
    #[error("database error: {0}")]
    Database(#[from] crate::error::Error),
}

impl MigrationError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error means the ledger collection does not exist.
    pub fn is_ledger_unavailable(&self) -> bool {
        match self {
            Self::LedgerUnavailable(_) => true,
            Self::Database(e) => e.is_collection_not_found(),
            _ => false,
        }
    }
}

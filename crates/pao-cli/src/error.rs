//! CLI error type.

use pao_core::{DefinitionError, MigrationError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors reported to the operator.
#[derive(Debug, Error)]
pub enum CliError {
    /// A required setting is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// An env file could not be loaded.
    #[error("failed to load env file {path}: {source}")]
    EnvFile {
        /// Env file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: dotenvy::Error,
    },

    /// The model manifest could not be read.
    #[error("failed to read model manifest {path}: {source}")]
    ManifestIo {
        /// Manifest path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The model manifest is malformed.
    #[error("invalid model manifest: {0}")]
    Manifest(String),

    /// A model declaration is invalid.
    #[error("{0}")]
    Definition(#[from] DefinitionError),

    /// Migration generation or application failed.
    #[error("{0}")]
    Migration(#[from] MigrationError),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] pao_core::Error),

    /// Output serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

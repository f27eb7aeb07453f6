//! PAO Core - model registry, schema compiler, and migration engine.
//!
//! This crate turns declarative model definitions into ordered, versioned
//! migration artifacts and applies them to a document/graph database while
//! keeping a ledger of what has already run.

pub mod error;
pub mod migration;
pub mod model;
pub mod schema;
pub mod storage;

pub use error::Error;
pub use migration::{
    ApplyReport, Artifact, ArtifactName, ArtifactOutcome, ArtifactStore, BuildReport,
    BuilderConfig, LedgerEntry, MigrationBuilder, MigrationError, MigrationLedger, Migrator,
    Operation, LEDGER_COLLECTION,
};
pub use model::{
    DefinitionError, EdgeDef, ElementType, FieldDef, FieldType, IndexDef, IndexFields, IndexKind,
    Level, ModelDefinition, ModelRef, ModelRegistry,
};
pub use schema::{
    CollectionSchema, CompiledSchema, EdgeDefinition, IndexSpec, PropertySchema, SchemaCompiler,
    SchemaRule,
};
pub use storage::{
    CollectionInfo, CollectionKind, Cursor, Database, Document, DocumentQuery, SledDatabase,
    SortOrder, StorageConfig,
};

//! Migration engine for PAO.
//!
//! The [`MigrationBuilder`] turns registered models into ordered artifacts in
//! an [`ArtifactStore`]; the [`Migrator`] applies pending artifacts to a
//! [`Database`](crate::storage::Database) and journals each one in the
//! [`MigrationLedger`].
//!
//! # Artifact order
//!
//! | Ordinal | Artifact | Purpose |
//! |---------|----------|---------|
//! | 1 | `0001_pao_migrations` | Ledger collection |
//! | 2..n | `NNNN_<collection>` | One per registered model, in registration order |
//! | n+1 | `NNNN_<graph>` | Named graph over every edge collection |
//!
//! Later runs append superseding artifacts after these.
//!
//! # Example
//!
//! ```ignore
//! use pao_core::{BuilderConfig, MigrationBuilder, Migrator, SledDatabase};
//!
//! let mut builder = MigrationBuilder::new(BuilderConfig::new("migrations", "pao_graph"))?;
//! builder.build_all(&registry)?;
//!
//! let db = SledDatabase::open(&config)?;
//! let migrator = Migrator::new(&db, builder.store().clone());
//! migrator.apply_migrations()?;
//! ```

mod artifact;
mod builder;
mod error;
mod ledger;
mod migrator;
mod operation;
mod store;

pub use artifact::{Artifact, ArtifactName};
pub use builder::{ArtifactOutcome, BuildReport, BuilderConfig, MigrationBuilder};
pub use error::MigrationError;
pub use ledger::{LedgerEntry, MigrationLedger};
pub use migrator::{ApplyReport, Migrator};
pub use operation::Operation;
pub use store::ArtifactStore;

use crate::model::{DefinitionError, FieldDef, Level, ModelDefinition};

/// Collection holding the migration ledger.
pub const LEDGER_COLLECTION: &str = "pao_migrations";

/// Built-in model describing the ledger collection.
pub fn ledger_model() -> Result<ModelDefinition, DefinitionError> {
    ModelDefinition::new("PaoMigration")
        .with_collection_name(LEDGER_COLLECTION)
        .with_level(Level::Strict)
        .with_additional_properties(false)
        .with_field(
            FieldDef::int("migration_number")
                .with_index("migration_number_idx")
                .unique()
                .required(),
        )?
        .with_field(
            FieldDef::string("migration_name")
                .with_index("migration_name_idx")
                .required(),
        )?
        .with_field(
            FieldDef::string("migration_filename")
                .with_index("migration_filename_idx")
                .unique()
                .required(),
        )?
        .with_field(FieldDef::float("created_at").required())?
        .with_field(FieldDef::float("updated_at").required())
}

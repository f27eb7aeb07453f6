//! Operator commands. Each returns the text printed on success.

use crate::config::Settings;
use crate::error::CliError;
use crate::formatter::{format_ledger, OutputFormat};
use crate::manifest::load_registry;
use pao_core::{ArtifactStore, MigrationBuilder, Migrator, SledDatabase};
use tracing::info;

/// Generate migrations from the model manifest.
pub fn make_migrations(settings: &Settings, overwrite: bool) -> Result<String, CliError> {
    let config = settings.builder_config(overwrite)?;
    let registry = load_registry(&settings.models_file()?)?;

    let mut builder = MigrationBuilder::new(config)?;
    let report = builder.build_all(&registry)?;

    let mut output = format!(
        "Generated {} migration(s), {} unchanged",
        report.written(),
        report.unchanged()
    );
    for outcome in report.outcomes.iter().filter(|o| o.is_written()) {
        output.push_str(&format!("\n  {outcome}"));
    }
    Ok(output)
}

/// Create a blank migration.
pub fn new_migration(settings: &Settings, name: &str) -> Result<String, CliError> {
    let mut builder = MigrationBuilder::new(settings.builder_config(false)?)?;
    let artifact = builder.create_blank(name)?;
    let path = builder.store().path(&artifact);
    Ok(format!("Created migration {artifact} at {}", path.display()))
}

/// Apply every pending migration.
pub fn migrate(settings: &Settings, clean: bool) -> Result<String, CliError> {
    let storage = settings.storage_config(clean)?;
    let store = ArtifactStore::open(settings.migrations_dir()?)?;
    let db = SledDatabase::open(&storage)?;
    if clean {
        info!("database cleaned before applying migrations");
    }

    let report = Migrator::new(&db, store).apply_migrations()?;
    db.flush()?;

    let mut output = format!(
        "Applied {} migration(s), {} already applied",
        report.applied.len(),
        report.skipped
    );
    for name in &report.applied {
        output.push_str(&format!("\n  {name}"));
    }
    Ok(output)
}

/// Roll back the most recently applied migration.
pub fn migrate_rollback(settings: &Settings) -> Result<String, CliError> {
    let storage = settings.storage_config(false)?;
    let store = ArtifactStore::existing(settings.migrations_dir()?);
    let db = SledDatabase::open(&storage)?;

    let reverted = Migrator::new(&db, store).migrate_down()?;
    db.flush()?;

    Ok(match reverted {
        Some(entry) => format!("Rolled back {}", entry.migration_filename),
        None => "No migrations to roll back".to_string(),
    })
}

/// List applied migrations.
pub fn list_migrations(settings: &Settings, format: OutputFormat) -> Result<String, CliError> {
    let storage = settings.storage_config(false)?;
    let store = ArtifactStore::existing(settings.migrations_dir()?);
    let db = SledDatabase::open(&storage)?;

    let entries = Migrator::new(&db, store).list_migrations()?;
    format_ledger(&entries, format)
}

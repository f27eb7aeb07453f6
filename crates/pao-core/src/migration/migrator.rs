//! Migrator: applies pending artifacts and rolls back the latest one.

use super::{ArtifactName, ArtifactStore, LedgerEntry, MigrationError, MigrationLedger};
use crate::storage::Database;
use tracing::{debug, info, warn};

/// Outcome of [`Migrator::apply_migrations`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Artifacts applied during this run, in order.
    pub applied: Vec<ArtifactName>,
    /// Artifacts skipped because the ledger already records them.
    pub skipped: usize,
}

/// Applies artifacts from a store to a database.
pub struct Migrator<'a> {
    db: &'a dyn Database,
    store: ArtifactStore,
    ledger: MigrationLedger<'a>,
}

impl<'a> Migrator<'a> {
    /// Create a migrator over a database and an artifact store.
    pub fn new(db: &'a dyn Database, store: ArtifactStore) -> Self {
        Self {
            db,
            store,
            ledger: MigrationLedger::new(db),
        }
    }

    /// The ledger this migrator journals into.
    pub fn ledger(&self) -> &MigrationLedger<'a> {
        &self.ledger
    }

    /// Apply every artifact not yet recorded in the ledger, in name order.
    ///
    /// Stops at the first failing artifact. Artifacts applied earlier in the
    /// run stay applied and recorded.
    pub fn apply_migrations(&self) -> Result<ApplyReport, MigrationError> {
        let mut report = ApplyReport::default();

        for name in self.store.list()? {
            let filename = name.to_string();
            match self.ledger.find(&filename) {
                Ok(Some(_)) => {
                    debug!(artifact = %filename, "already applied");
                    report.skipped += 1;
                    continue;
                }
                Ok(None) => {}
                Err(e) if e.is_ledger_unavailable() => {
                    debug!(artifact = %filename, "ledger not created yet, treating as pending");
                }
                Err(e) => return Err(e),
            }

            let artifact = self.store.read(&name)?;
            info!(artifact = %filename, operations = artifact.up.len(), "applying migration");
            for operation in &artifact.up {
                operation
                    .apply(self.db)
                    .map_err(|source| MigrationError::ApplyFailed {
                        artifact: filename.clone(),
                        source,
                    })?;
            }

            match self.ledger.record(&name) {
                Ok(_) => {}
                Err(e) if e.is_ledger_unavailable() => {
                    warn!(
                        artifact = %filename,
                        "ledger collection missing, migration applied but not recorded"
                    );
                }
                Err(e) => return Err(e),
            }
            report.applied.push(name);
        }

        info!(
            applied = report.applied.len(),
            skipped = report.skipped,
            "migrations complete"
        );
        Ok(report)
    }

    /// Revert the most recently applied artifact and drop its ledger entry.
    ///
    /// Returns the reverted entry, or `None` if nothing has been applied.
    pub fn migrate_down(&self) -> Result<Option<LedgerEntry>, MigrationError> {
        let mut entries = match self.ledger.list() {
            Ok(entries) => entries,
            Err(e) if e.is_ledger_unavailable() => return Ok(None),
            Err(e) => return Err(e),
        };
        let Some(last) = entries.pop() else {
            info!("no migrations to roll back");
            return Ok(None);
        };

        let name = last.artifact_name().ok_or_else(|| {
            MigrationError::InvalidLedgerEntry(format!(
                "bad migration filename '{}'",
                last.migration_filename
            ))
        })?;
        let artifact = self.store.read(&name)?;

        info!(artifact = %name, operations = artifact.down.len(), "reverting migration");
        for operation in &artifact.down {
            operation
                .apply(self.db)
                .map_err(|source| MigrationError::RevertFailed {
                    artifact: name.to_string(),
                    source,
                })?;
        }

        match self.ledger.remove(&last.key) {
            Ok(_) => {}
            // Reverting the ledger artifact drops the ledger with it.
            Err(e) if e.is_ledger_unavailable() => {
                debug!(artifact = %name, "ledger collection removed by rollback");
            }
            Err(e) => return Err(e),
        }

        Ok(Some(last))
    }

    /// Applied artifacts, ordered by name. Empty if nothing was ever applied.
    pub fn list_migrations(&self) -> Result<Vec<LedgerEntry>, MigrationError> {
        match self.ledger.list() {
            Ok(entries) => Ok(entries),
            Err(e) if e.is_ledger_unavailable() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

//! Migration ledger: applied artifacts, journaled in the database.

use super::{ArtifactName, MigrationError, LEDGER_COLLECTION};
use crate::error::Error;
use crate::storage::{Database, Document, DocumentQuery, SortOrder};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

/// One applied artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Document key in the ledger collection.
    #[serde(rename = "_key")]
    pub key: String,
    /// Artifact ordinal.
    pub migration_number: u32,
    /// Artifact suffix.
    pub migration_name: String,
    /// Artifact name (`NNNN_<suffix>`).
    pub migration_filename: String,
    /// When the artifact was applied, in seconds since the Unix epoch.
    pub created_at: f64,
    /// When the entry was last touched, in seconds since the Unix epoch.
    pub updated_at: f64,
}

impl LedgerEntry {
    /// The artifact this entry records, if the filename is canonical.
    pub fn artifact_name(&self) -> Option<ArtifactName> {
        ArtifactName::parse(&self.migration_filename)
    }

    fn from_document(document: Document) -> Result<Self, MigrationError> {
        serde_json::from_value(Value::Object(document))
            .map_err(|e| MigrationError::InvalidLedgerEntry(e.to_string()))
    }
}

/// Ledger operations over the bookkeeping collection.
pub struct MigrationLedger<'a> {
    db: &'a dyn Database,
}

impl<'a> MigrationLedger<'a> {
    /// Create a ledger over a database.
    pub fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// Find the entry for an artifact name.
    pub fn find(&self, filename: &str) -> Result<Option<LedgerEntry>, MigrationError> {
        let query = DocumentQuery::new(LEDGER_COLLECTION)
            .filter_eq("migration_filename", filename)
            .limit(1);
        let mut cursor = self.db.query(&query).map_err(ledger_error)?;
        cursor.next().map(LedgerEntry::from_document).transpose()
    }

    /// Append an entry for an applied artifact.
    ///
    /// Fails with [`MigrationError::LedgerUnavailable`] if the bookkeeping
    /// collection does not exist yet.
    pub fn record(&self, name: &ArtifactName) -> Result<LedgerEntry, MigrationError> {
        let now = Utc::now().timestamp_micros() as f64 / 1_000_000.0;
        let document = json!({
            "migration_number": name.ordinal,
            "migration_name": name.suffix,
            "migration_filename": name.to_string(),
            "created_at": now,
            "updated_at": now,
        });
        let Value::Object(document) = document else {
            return Err(MigrationError::InvalidLedgerEntry(name.to_string()));
        };

        let stored = self
            .db
            .insert(LEDGER_COLLECTION, document)
            .map_err(ledger_error)?;
        debug!(artifact = %name, "ledger entry recorded");
        LedgerEntry::from_document(stored)
    }

    /// Every entry, ordered by migration number, then filename.
    pub fn list(&self) -> Result<Vec<LedgerEntry>, MigrationError> {
        let query = DocumentQuery::new(LEDGER_COLLECTION)
            .sort_by("migration_number", SortOrder::Asc)
            .sort_by("migration_filename", SortOrder::Asc);
        self.db
            .query(&query)
            .map_err(ledger_error)?
            .map(LedgerEntry::from_document)
            .collect()
    }

    /// Delete one entry by key. Returns whether it existed.
    pub fn remove(&self, key: &str) -> Result<bool, MigrationError> {
        self.db.remove(LEDGER_COLLECTION, key).map_err(ledger_error)
    }
}

fn ledger_error(error: Error) -> MigrationError {
    if error.is_collection_not_found() {
        MigrationError::LedgerUnavailable(LEDGER_COLLECTION.to_string())
    } else {
        MigrationError::Database(error)
    }
}

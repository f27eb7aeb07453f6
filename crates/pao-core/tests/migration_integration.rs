//! Integration tests for migration generation, application and rollback.

use pao_core::{
    ArtifactName, ArtifactOutcome, BuilderConfig, Database, DocumentQuery, EdgeDef, Error,
    FieldDef, IndexDef, MigrationBuilder, MigrationError, Migrator, ModelDefinition,
    ModelRegistry, SledDatabase, StorageConfig, LEDGER_COLLECTION,
};
use serde_json::{json, Value};
use std::fs;

const GRAPH: &str = "pao_graph";

struct TestContext {
    db: SledDatabase,
    _migrations_dir: tempfile::TempDir,
    migrations_path: std::path::PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let migrations_dir = tempfile::tempdir().unwrap();
        let migrations_path = migrations_dir.path().join("migrations");
        Self {
            db: SledDatabase::open(&StorageConfig::temporary()).unwrap(),
            _migrations_dir: migrations_dir,
            migrations_path,
        }
    }

    fn builder(&self) -> MigrationBuilder {
        MigrationBuilder::new(BuilderConfig::new(&self.migrations_path, GRAPH)).unwrap()
    }

    fn migrator(&self) -> Migrator<'_> {
        Migrator::new(&self.db, self.builder().store().clone())
    }

    fn artifact_names(&self) -> Vec<String> {
        self.builder()
            .store()
            .list()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn snapshot(&self) -> Vec<(String, String)> {
        let builder = self.builder();
        builder
            .store()
            .list()
            .unwrap()
            .into_iter()
            .map(|name| {
                let text = builder.store().read_text(&name).unwrap();
                (name.to_string(), text)
            })
            .collect()
    }
}

fn model_a() -> ModelDefinition {
    ModelDefinition::new("A")
        .with_collection_name("A")
        .with_field(FieldDef::string("title"))
        .unwrap()
}

fn model_b() -> ModelDefinition {
    ModelDefinition::new("B")
        .with_collection_name("B")
        .with_field(FieldDef::string("name").required())
        .unwrap()
        .with_field(FieldDef::string("email").with_index("email_idx").unique())
        .unwrap()
        .with_index(IndexDef::ttl("expires_idx", vec!["expires_at".to_string()], 3600))
        .unwrap()
}

fn model_c() -> ModelDefinition {
    ModelDefinition::new("C")
        .with_collection_name("C")
        .with_edge(EdgeDef::to_named("a", "A"))
        .unwrap()
}

fn registry() -> ModelRegistry {
    ModelRegistry::new()
        .with_model(model_a())
        .unwrap()
        .with_model(model_b())
        .unwrap()
        .with_model(model_c())
        .unwrap()
}

fn doc(value: Value) -> pao_core::Document {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected object"),
    }
}

#[test]
fn test_generate_scenario_artifacts() {
    let ctx = TestContext::new();
    let report = ctx.builder().build_all(&registry()).unwrap();

    assert_eq!(report.written(), 5);
    assert_eq!(
        ctx.artifact_names(),
        vec!["0001_pao_migrations", "0002_A", "0003_B", "0004_C", "0005_pao_graph"]
    );
}

#[test]
fn test_generate_is_idempotent() {
    let ctx = TestContext::new();
    ctx.builder().build_all(&registry()).unwrap();
    let before = ctx.snapshot();

    let report = ctx.builder().build_all(&registry()).unwrap();
    assert_eq!(report.written(), 0);
    assert!(report
        .outcomes
        .iter()
        .all(|o| matches!(o, ArtifactOutcome::Unchanged(_))));
    assert_eq!(ctx.snapshot(), before);
}

#[test]
fn test_ordinals_are_contiguous() {
    let ctx = TestContext::new();
    let mut builder = ctx.builder();
    builder.build_all(&registry()).unwrap();

    let ordinals: Vec<u32> = builder
        .store()
        .list()
        .unwrap()
        .iter()
        .map(|n| n.ordinal)
        .collect();
    assert_eq!(ordinals, vec![1, 2, 3, 4, 5]);
    assert_eq!(builder.latest_for(LEDGER_COLLECTION).map(|n| n.ordinal), Some(1));
    assert_eq!(builder.latest_for(GRAPH).map(|n| n.ordinal), Some(5));
}

#[test]
fn test_apply_scenario() {
    let ctx = TestContext::new();
    ctx.builder().build_all(&registry()).unwrap();
    let migrator = ctx.migrator();

    let report = migrator.apply_migrations().unwrap();
    assert_eq!(report.applied.len(), 5);

    let entries = migrator.list_migrations().unwrap();
    let files: Vec<&str> = entries.iter().map(|e| e.migration_filename.as_str()).collect();
    assert_eq!(
        files,
        vec!["0001_pao_migrations", "0002_A", "0003_B", "0004_C", "0005_pao_graph"]
    );
    assert_eq!(entries[2].migration_number, 3);
    assert_eq!(entries[2].migration_name, "B");

    for collection in ["A", "B", "C", "C__A", LEDGER_COLLECTION] {
        assert!(ctx.db.has_collection(collection).unwrap(), "{collection}");
    }
    assert!(ctx.db.has_graph(GRAPH).unwrap());

    let b_indexes: Vec<String> = ctx
        .db
        .indexes("B")
        .unwrap()
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert_eq!(b_indexes, vec!["email_idx", "expires_idx"]);
}

#[test]
fn test_applied_schema_is_enforced() {
    let ctx = TestContext::new();
    ctx.builder().build_all(&registry()).unwrap();
    ctx.migrator().apply_migrations().unwrap();

    ctx.db
        .insert("B", doc(json!({"name": "ann", "email": "ann@example.com"})))
        .unwrap();

    let missing_required = ctx.db.insert("B", doc(json!({"email": "bob@example.com"})));
    assert!(matches!(missing_required, Err(Error::SchemaViolation { .. })));

    let duplicate = ctx
        .db
        .insert("B", doc(json!({"name": "bob", "email": "ann@example.com"})));
    assert!(matches!(duplicate, Err(Error::UniqueViolation { .. })));
}

#[test]
fn test_apply_is_idempotent() {
    let ctx = TestContext::new();
    ctx.builder().build_all(&registry()).unwrap();
    let migrator = ctx.migrator();
    migrator.apply_migrations().unwrap();

    let again = migrator.apply_migrations().unwrap();
    assert!(again.applied.is_empty());
    assert_eq!(again.skipped, 5);
    assert_eq!(migrator.list_migrations().unwrap().len(), 5);
}

#[test]
fn test_rollback_removes_graph() {
    let ctx = TestContext::new();
    ctx.builder().build_all(&registry()).unwrap();
    let migrator = ctx.migrator();
    migrator.apply_migrations().unwrap();

    let reverted = migrator.migrate_down().unwrap().unwrap();
    assert_eq!(reverted.migration_filename, "0005_pao_graph");
    assert!(!ctx.db.has_graph(GRAPH).unwrap());
    assert!(ctx.db.has_collection("C__A").unwrap());
    assert_eq!(migrator.list_migrations().unwrap().len(), 4);

    let reverted = migrator.migrate_down().unwrap().unwrap();
    assert_eq!(reverted.migration_filename, "0004_C");
    assert!(!ctx.db.has_collection("C").unwrap());

    let report = migrator.apply_migrations().unwrap();
    let reapplied: Vec<String> = report.applied.iter().map(ToString::to_string).collect();
    assert_eq!(reapplied, vec!["0004_C", "0005_pao_graph"]);
}

#[test]
fn test_full_rollback_empties_ledger() {
    let ctx = TestContext::new();
    ctx.builder().build_all(&registry()).unwrap();
    let migrator = ctx.migrator();
    migrator.apply_migrations().unwrap();

    for _ in 0..5 {
        assert!(migrator.migrate_down().unwrap().is_some());
    }
    assert!(migrator.migrate_down().unwrap().is_none());
    assert!(migrator.list_migrations().unwrap().is_empty());
    assert!(!ctx.db.has_collection(LEDGER_COLLECTION).unwrap());
}

#[test]
fn test_model_change_supersedes_then_stabilizes() {
    let ctx = TestContext::new();
    ctx.builder().build_all(&registry()).unwrap();
    let migrator = ctx.migrator();
    migrator.apply_migrations().unwrap();

    let changed = ModelRegistry::new()
        .with_model(
            model_a()
                .with_field(FieldDef::int("rank").with_index("rank_idx"))
                .unwrap(),
        )
        .unwrap()
        .with_model(model_b())
        .unwrap()
        .with_model(model_c())
        .unwrap();

    let report = ctx.builder().build_all(&changed).unwrap();
    assert_eq!(report.written(), 1);
    assert_eq!(ctx.artifact_names().last().map(String::as_str), Some("0006_A"));

    let again = ctx.builder().build_all(&changed).unwrap();
    assert_eq!(again.written(), 0);
    assert_eq!(ctx.artifact_names().len(), 6);

    let applied = migrator.apply_migrations().unwrap();
    assert_eq!(applied.applied, vec![ArtifactName::new(6, "A")]);
    let a_indexes: Vec<String> = ctx
        .db
        .indexes("A")
        .unwrap()
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert_eq!(a_indexes, vec!["rank_idx"]);
}

#[test]
fn test_overwrite_keeps_artifact_count() {
    let ctx = TestContext::new();
    ctx.builder().build_all(&registry()).unwrap();

    let changed = ModelRegistry::new()
        .with_model(model_a().with_field(FieldDef::float("score")).unwrap())
        .unwrap()
        .with_model(model_b())
        .unwrap()
        .with_model(model_c())
        .unwrap();

    let mut builder = MigrationBuilder::new(
        BuilderConfig::new(&ctx.migrations_path, GRAPH).with_overwrite(true),
    )
    .unwrap();
    let report = builder.build_all(&changed).unwrap();

    assert_eq!(report.written(), 1);
    assert_eq!(
        report.outcomes[1],
        ArtifactOutcome::Rewritten(ArtifactName::new(2, "A"))
    );
    assert_eq!(ctx.artifact_names().len(), 5);

    let text = builder.store().read_text(&ArtifactName::new(2, "A")).unwrap();
    assert!(text.contains("\"score\""));
}

#[test]
fn test_definition_error_aborts_before_writes() {
    let ctx = TestContext::new();
    let broken = ModelRegistry::new()
        .with_model(model_a())
        .unwrap()
        .with_model(
            ModelDefinition::new("D")
                .with_collection_name("D")
                .with_edge(EdgeDef::to_named("missing", "Missing"))
                .unwrap(),
        )
        .unwrap();

    let err = ctx.builder().build_all(&broken).unwrap_err();
    assert!(matches!(err, MigrationError::Definition(_)));
    assert!(ctx.artifact_names().is_empty());
}

#[test]
fn test_list_before_any_apply_is_empty() {
    let ctx = TestContext::new();
    ctx.builder().build_all(&registry()).unwrap();
    let migrator = ctx.migrator();

    assert!(migrator.list_migrations().unwrap().is_empty());
    assert!(migrator.migrate_down().unwrap().is_none());
}

#[test]
fn test_applied_but_unrecorded_is_retried() {
    let ctx = TestContext::new();
    ctx.builder().build_all(&registry()).unwrap();
    let migrator = ctx.migrator();
    migrator.apply_migrations().unwrap();

    // Drop the ledger entry for 0003_B, as if the process died before recording it.
    let entry = migrator.ledger().find("0003_B").unwrap().unwrap();
    assert!(ctx.db.remove(LEDGER_COLLECTION, &entry.key).unwrap());

    let report = migrator.apply_migrations().unwrap();
    assert_eq!(report.applied, vec![ArtifactName::new(3, "B")]);
    assert_eq!(migrator.list_migrations().unwrap().len(), 5);
    assert_eq!(ctx.db.indexes("B").unwrap().len(), 2);
}

#[test]
fn test_unrelated_files_are_ignored() {
    let ctx = TestContext::new();
    ctx.builder().build_all(&registry()).unwrap();
    fs::write(ctx.migrations_path.join("notes.txt"), "hello").unwrap();

    let report = ctx.migrator().apply_migrations().unwrap();
    assert_eq!(report.applied.len(), 5);

    let rows = ctx
        .db
        .query(&DocumentQuery::new(LEDGER_COLLECTION))
        .unwrap()
        .count();
    assert_eq!(rows, 5);
}

//! Migration builder: registered models in, ordered artifacts out.

use super::{
    ledger_model, Artifact, ArtifactName, ArtifactStore, MigrationError, LEDGER_COLLECTION,
};
use crate::model::ModelRegistry;
use crate::schema::{CompiledSchema, EdgeDefinition, SchemaCompiler};
use heck::ToSnakeCase;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

/// Builder configuration.
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Directory holding the artifacts.
    pub migrations_dir: PathBuf,
    /// Name of the graph spanning every edge collection.
    pub graph_name: String,
    /// Rewrite the latest artifact of a target in place instead of
    /// appending a superseding one.
    pub overwrite: bool,
}

impl BuilderConfig {
    /// Create a configuration.
    pub fn new(migrations_dir: impl Into<PathBuf>, graph_name: impl Into<String>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
            graph_name: graph_name.into(),
            overwrite: false,
        }
    }

    /// Enable or disable in-place rewriting.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// What happened to one target during a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactOutcome {
    /// First artifact for the target.
    Created(ArtifactName),
    /// New artifact superseding an earlier one.
    Superseded(ArtifactName),
    /// Existing artifact rewritten in place.
    Rewritten(ArtifactName),
    /// Latest artifact already has the generated content.
    Unchanged(ArtifactName),
}

impl ArtifactOutcome {
    /// Artifact the outcome refers to.
    pub fn name(&self) -> &ArtifactName {
        match self {
            Self::Created(n) | Self::Superseded(n) | Self::Rewritten(n) | Self::Unchanged(n) => n,
        }
    }

    /// Whether a file was written.
    pub fn is_written(&self) -> bool {
        !matches!(self, Self::Unchanged(_))
    }
}

impl fmt::Display for ArtifactOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created(n) => write!(f, "created {n}"),
            Self::Superseded(n) => write!(f, "created {n} (update)"),
            Self::Rewritten(n) => write!(f, "rewrote {n}"),
            Self::Unchanged(n) => write!(f, "unchanged {n}"),
        }
    }
}

/// Outcome of [`MigrationBuilder::build_all`], in build order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// One outcome per target: ledger, each model, then the graph.
    pub outcomes: Vec<ArtifactOutcome>,
}

impl BuildReport {
    /// Number of artifacts written.
    pub fn written(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_written()).count()
    }

    /// Number of targets whose artifact was already current.
    pub fn unchanged(&self) -> usize {
        self.outcomes.len() - self.written()
    }
}

/// Generates and maintains migration artifacts.
pub struct MigrationBuilder {
    config: BuilderConfig,
    store: ArtifactStore,
    /// Artifact names per target (collection or graph), ascending.
    by_target: BTreeMap<String, Vec<ArtifactName>>,
    count: usize,
    max_ordinal: u32,
}

impl MigrationBuilder {
    /// Create a builder, opening (and creating) the migrations directory.
    pub fn new(config: BuilderConfig) -> Result<Self, MigrationError> {
        if config.graph_name.trim().is_empty() {
            return Err(MigrationError::Config("graph name is required".into()));
        }
        if config.migrations_dir.as_os_str().is_empty() {
            return Err(MigrationError::Config("migrations directory is required".into()));
        }

        let store = ArtifactStore::open(&config.migrations_dir)?;
        let mut builder = Self {
            config,
            store,
            by_target: BTreeMap::new(),
            count: 0,
            max_ordinal: 0,
        };
        builder.resync()?;
        Ok(builder)
    }

    /// The artifact store.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// The configuration.
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Number of artifacts in the store.
    pub fn artifact_count(&self) -> usize {
        self.count
    }

    /// Latest artifact targeting a collection or graph.
    pub fn latest_for(&self, target: &str) -> Option<&ArtifactName> {
        self.by_target.get(target).and_then(|names| names.last())
    }

    /// Reload the index of existing artifacts from the store.
    pub fn resync(&mut self) -> Result<(), MigrationError> {
        let names = self.store.list()?;

        self.by_target.clear();
        self.count = names.len();
        self.max_ordinal = names.iter().map(|n| n.ordinal).max().unwrap_or(0);
        for name in names {
            self.by_target
                .entry(name.suffix.clone())
                .or_default()
                .push(name);
        }
        Ok(())
    }

    /// Name for the next artifact.
    pub fn new_artifact_name(&self, suffix: &str) -> ArtifactName {
        let ordinal = (self.count as u32).max(self.max_ordinal) + 1;
        ArtifactName::new(ordinal, suffix)
    }

    /// Generate artifacts for the ledger, every registered model, and the graph.
    ///
    /// Every model is compiled before anything is written, so a definition
    /// error leaves the store untouched. The graph name must not match the
    /// ledger or any model collection.
    pub fn build_all(&mut self, registry: &ModelRegistry) -> Result<BuildReport, MigrationError> {
        let graph = self.config.graph_name.as_str();
        let collides = graph == LEDGER_COLLECTION
            || registry.discover().iter().any(|m| m.collection() == graph);
        if collides {
            return Err(MigrationError::Config(format!(
                "graph name '{graph}' collides with a collection name"
            )));
        }

        let ledger = SchemaCompiler::compile(&ledger_model()?, registry)?;
        let compiled = registry
            .discover()
            .iter()
            .map(|model| SchemaCompiler::compile(model, registry))
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = BuildReport::default();
        report.outcomes.push(self.create_or_update(&ledger)?);
        for schema in &compiled {
            report.outcomes.push(self.create_or_update(schema)?);
        }

        let edges = merge_edges(compiled.iter().flat_map(|c| c.edges.iter()));
        report.outcomes.push(self.create_graph_artifact(edges)?);

        info!(
            written = report.written(),
            unchanged = report.unchanged(),
            "migrations generated"
        );
        Ok(report)
    }

    /// Create, supersede, rewrite or keep the artifact for one collection.
    pub fn create_or_update(
        &mut self,
        compiled: &CompiledSchema,
    ) -> Result<ArtifactOutcome, MigrationError> {
        let target = compiled.collection.as_str();
        let create = Artifact::create_collection(compiled).render()?;

        let Some(latest) = self.latest_for(target).cloned() else {
            return self.write_new(target, &create, ArtifactOutcome::Created);
        };

        let update = Artifact::update_collection(compiled).render()?;
        let existing = self.store.read_text(&latest)?;

        if self.config.overwrite {
            let is_first = self.by_target.get(target).map_or(true, |names| names.len() == 1);
            let desired = if is_first { create } else { update };
            return self.rewrite(latest, &existing, &desired);
        }

        if existing == create || existing == update {
            debug!(artifact = %latest, "artifact unchanged");
            return Ok(ArtifactOutcome::Unchanged(latest));
        }
        self.write_new(target, &update, ArtifactOutcome::Superseded)
    }

    /// Create, supersede, rewrite or keep the graph artifact.
    pub fn create_graph_artifact(
        &mut self,
        edges: Vec<EdgeDefinition>,
    ) -> Result<ArtifactOutcome, MigrationError> {
        let target = self.config.graph_name.clone();
        let text = Artifact::graph(&target, edges).render()?;

        let Some(latest) = self.latest_for(&target).cloned() else {
            return self.write_new(&target, &text, ArtifactOutcome::Created);
        };

        let existing = self.store.read_text(&latest)?;
        if self.config.overwrite {
            return self.rewrite(latest, &existing, &text);
        }
        if existing == text {
            debug!(artifact = %latest, "artifact unchanged");
            return Ok(ArtifactOutcome::Unchanged(latest));
        }
        self.write_new(&target, &text, ArtifactOutcome::Superseded)
    }

    /// Create an artifact with empty directives.
    pub fn create_blank(&mut self, name: &str) -> Result<ArtifactName, MigrationError> {
        let suffix = name.to_snake_case();
        if suffix.is_empty() {
            return Err(MigrationError::Config("migration name is required".into()));
        }

        let text = Artifact::blank().render()?;
        let outcome = self.write_new(&suffix, &text, ArtifactOutcome::Created)?;
        Ok(outcome.name().clone())
    }

    fn write_new(
        &mut self,
        target: &str,
        text: &str,
        outcome: fn(ArtifactName) -> ArtifactOutcome,
    ) -> Result<ArtifactOutcome, MigrationError> {
        let name = self.new_artifact_name(target);
        self.store.write_text(&name, text)?;
        info!(artifact = %name, "migration created");
        self.resync()?;
        Ok(outcome(name))
    }

    fn rewrite(
        &mut self,
        latest: ArtifactName,
        existing: &str,
        desired: &str,
    ) -> Result<ArtifactOutcome, MigrationError> {
        if existing == desired {
            debug!(artifact = %latest, "artifact unchanged");
            return Ok(ArtifactOutcome::Unchanged(latest));
        }
        self.store.write_text(&latest, desired)?;
        info!(artifact = %latest, "migration rewritten");
        self.resync()?;
        Ok(ArtifactOutcome::Rewritten(latest))
    }
}

/// Union of edge definitions, one per edge collection, in first-seen order.
fn merge_edges<'a>(edges: impl Iterator<Item = &'a EdgeDefinition>) -> Vec<EdgeDefinition> {
    let mut merged: Vec<EdgeDefinition> = Vec::new();
    for edge in edges {
        match merged
            .iter_mut()
            .find(|m| m.edge_collection == edge.edge_collection)
        {
            Some(existing) => {
                for from in &edge.from_vertex_collections {
                    if !existing.from_vertex_collections.contains(from) {
                        existing.from_vertex_collections.push(from.clone());
                    }
                }
                for to in &edge.to_vertex_collections {
                    if !existing.to_vertex_collections.contains(to) {
                        existing.to_vertex_collections.push(to.clone());
                    }
                }
            }
            None => merged.push(edge.clone()),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::Operation;
    use crate::model::{EdgeDef, FieldDef, ModelDefinition};

    fn registry() -> ModelRegistry {
        ModelRegistry::new()
            .with_model(
                ModelDefinition::new("FooModel")
                    .with_field(FieldDef::string("name").required())
                    .unwrap()
                    .with_edge(EdgeDef::to_named("bars", "BarModel"))
                    .unwrap(),
            )
            .unwrap()
            .with_model(ModelDefinition::new("BarModel"))
            .unwrap()
    }

    fn names(builder: &MigrationBuilder) -> Vec<String> {
        builder
            .store()
            .list()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_config_requires_graph_name() {
        let dir = tempfile::tempdir().unwrap();
        let result = MigrationBuilder::new(BuilderConfig::new(dir.path(), " "));
        assert!(matches!(result, Err(MigrationError::Config(_))));
    }

    #[test]
    fn test_graph_name_colliding_with_collection_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let social = ModelRegistry::new()
            .with_model(ModelDefinition::new("Social").with_collection_name("social"))
            .unwrap();

        let mut builder = MigrationBuilder::new(BuilderConfig::new(dir.path(), "social")).unwrap();
        let result = builder.build_all(&social);
        assert!(matches!(result, Err(MigrationError::Config(_))));
        assert_eq!(builder.artifact_count(), 0);

        let mut builder =
            MigrationBuilder::new(BuilderConfig::new(dir.path(), LEDGER_COLLECTION)).unwrap();
        let result = builder.build_all(&social);
        assert!(matches!(result, Err(MigrationError::Config(_))));
        assert!(builder.store().list().unwrap().is_empty());
    }

    #[test]
    fn test_build_all_order_and_idempotence() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = MigrationBuilder::new(BuilderConfig::new(dir.path(), "pao_graph")).unwrap();

        let report = builder.build_all(&registry()).unwrap();
        assert_eq!(report.written(), 4);
        assert_eq!(
            names(&builder),
            vec!["0001_pao_migrations", "0002_foos", "0003_bars", "0004_pao_graph"]
        );

        let again = builder.build_all(&registry()).unwrap();
        assert_eq!(again.written(), 0);
        assert_eq!(again.unchanged(), 4);
        assert_eq!(builder.artifact_count(), 4);
    }

    #[test]
    fn test_changed_model_supersedes_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = MigrationBuilder::new(BuilderConfig::new(dir.path(), "g")).unwrap();
        builder.build_all(&registry()).unwrap();

        let changed = ModelRegistry::new()
            .with_model(
                ModelDefinition::new("FooModel")
                    .with_field(FieldDef::string("name").required())
                    .unwrap()
                    .with_field(FieldDef::int("age"))
                    .unwrap()
                    .with_edge(EdgeDef::to_named("bars", "BarModel"))
                    .unwrap(),
            )
            .unwrap()
            .with_model(ModelDefinition::new("BarModel"))
            .unwrap();

        let report = builder.build_all(&changed).unwrap();
        assert_eq!(
            report.outcomes[1],
            ArtifactOutcome::Superseded(ArtifactName::new(5, "foos"))
        );
        assert_eq!(builder.artifact_count(), 5);

        let artifact = builder.store().read(&ArtifactName::new(5, "foos")).unwrap();
        assert!(matches!(artifact.up[0], Operation::ConfigureCollection { .. }));

        builder.build_all(&changed).unwrap();
        assert_eq!(builder.artifact_count(), 5);
    }

    #[test]
    fn test_overwrite_rewrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = MigrationBuilder::new(BuilderConfig::new(dir.path(), "g")).unwrap();
        builder.build_all(&registry()).unwrap();

        let changed = ModelRegistry::new()
            .with_model(
                ModelDefinition::new("FooModel")
                    .with_field(FieldDef::string("title"))
                    .unwrap(),
            )
            .unwrap()
            .with_model(ModelDefinition::new("BarModel"))
            .unwrap();

        let mut overwriting =
            MigrationBuilder::new(BuilderConfig::new(dir.path(), "g").with_overwrite(true)).unwrap();
        let report = overwriting.build_all(&changed).unwrap();

        assert_eq!(
            report.outcomes[1],
            ArtifactOutcome::Rewritten(ArtifactName::new(2, "foos"))
        );
        assert_eq!(
            report.outcomes[3],
            ArtifactOutcome::Rewritten(ArtifactName::new(4, "g"))
        );
        assert_eq!(overwriting.artifact_count(), 4);

        let artifact = overwriting.store().read(&ArtifactName::new(2, "foos")).unwrap();
        assert!(matches!(artifact.up[0], Operation::CreateCollection { .. }));
    }

    #[test]
    fn test_definition_error_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = MigrationBuilder::new(BuilderConfig::new(dir.path(), "g")).unwrap();

        let broken = ModelRegistry::new()
            .with_model(
                ModelDefinition::new("FooModel")
                    .with_edge(EdgeDef::to_named("ghosts", "GhostModel"))
                    .unwrap(),
            )
            .unwrap();

        let err = builder.build_all(&broken).unwrap_err();
        assert!(matches!(err, MigrationError::Definition(_)));
        assert_eq!(builder.artifact_count(), 0);
        assert!(names(&builder).is_empty());
    }

    #[test]
    fn test_blank_and_next_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = MigrationBuilder::new(BuilderConfig::new(dir.path(), "g")).unwrap();

        assert_eq!(builder.new_artifact_name("x"), ArtifactName::new(1, "x"));
        let name = builder.create_blank("Seed Data").unwrap();
        assert_eq!(name.to_string(), "0001_seed_data");
        assert_eq!(builder.new_artifact_name("x"), ArtifactName::new(2, "x"));
        assert!(matches!(
            builder.create_blank("  "),
            Err(MigrationError::Config(_))
        ));
    }

    #[test]
    fn test_merge_edges_unions_vertices() {
        let a = EdgeDefinition {
            edge_collection: "a__b".into(),
            from_vertex_collections: vec!["a".into()],
            to_vertex_collections: vec!["b".into()],
        };
        let c = EdgeDefinition {
            edge_collection: "c__a".into(),
            from_vertex_collections: vec!["c".into()],
            to_vertex_collections: vec!["a".into()],
        };
        let merged = merge_edges([&a, &c, &a].into_iter());
        assert_eq!(merged, vec![a, c]);
    }
}

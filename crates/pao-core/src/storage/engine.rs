//! Embedded document/graph database on sled.

use super::validator::validate_document;
use super::{CollectionInfo, CollectionKind, Cursor, Database, Document, DocumentQuery, StorageConfig};
use crate::error::Error;
use crate::model::IndexKind;
use crate::schema::{CollectionSchema, EdgeDefinition, IndexSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sled::{Db, Tree};
use tracing::{debug, info};

/// Tree name for collection metadata (name -> CollectionInfo JSON).
const COLLECTIONS_TREE: &str = "meta:collections";

/// Tree name for graph metadata (name -> GraphInfo JSON).
const GRAPHS_TREE: &str = "meta:graphs";

/// Prefix for per-collection document trees.
const DOCS_PREFIX: &str = "docs:";

/// Stored description of a named graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct GraphInfo {
    name: String,
    edge_definitions: Vec<EdgeDefinition>,
}

/// Document database backed by sled.
///
/// Each collection's documents live in their own tree, keyed by `_key`.
/// Collection and graph metadata are JSON values in two metadata trees.
pub struct SledDatabase {
    db: Db,
    collections: Tree,
    graphs: Tree,
}

impl SledDatabase {
    /// Open or create a database with the given configuration.
    pub fn open(config: &StorageConfig) -> Result<Self, Error> {
        if config.clean && !config.temporary {
            let path = config.path();
            if path.exists() {
                info!(path = %path.display(), "removing existing database");
                std::fs::remove_dir_all(&path)?;
            }
        }

        let db = config.to_sled_config().open()?;
        let collections = db.open_tree(COLLECTIONS_TREE)?;
        let graphs = db.open_tree(GRAPHS_TREE)?;

        debug!(name = %config.name, temporary = config.temporary, "database opened");

        Ok(Self {
            db,
            collections,
            graphs,
        })
    }

    /// Open a temporary database that is deleted on drop.
    pub fn temporary() -> Result<Self, Error> {
        Self::open(&StorageConfig::temporary())
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.db.flush()?;
        Ok(())
    }

    /// Edge definitions of a named graph, if it exists.
    pub fn graph(&self, name: &str) -> Result<Option<Vec<EdgeDefinition>>, Error> {
        match self.graphs.get(name)? {
            Some(bytes) => {
                let graph: GraphInfo = serde_json::from_slice(&bytes)?;
                Ok(Some(graph.edge_definitions))
            }
            None => Ok(None),
        }
    }

    /// Metadata of one collection, if it exists.
    pub fn collection(&self, name: &str) -> Result<Option<CollectionInfo>, Error> {
        match self.collections.get(name)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn require_collection(&self, name: &str) -> Result<CollectionInfo, Error> {
        self.collection(name)?
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))
    }

    fn save_collection(&self, info: &CollectionInfo) -> Result<(), Error> {
        let bytes = serde_json::to_vec(info)?;
        self.collections.insert(info.name.as_bytes(), bytes)?;
        Ok(())
    }

    fn docs_tree(&self, collection: &str) -> Result<Tree, Error> {
        Ok(self.db.open_tree(format!("{DOCS_PREFIX}{collection}"))?)
    }

    fn scan(&self, collection: &str) -> Result<Vec<Document>, Error> {
        let tree = self.docs_tree(collection)?;
        let mut documents = Vec::with_capacity(tree.len());
        for result in tree.iter() {
            let (_, bytes) = result?;
            documents.push(serde_json::from_slice(&bytes)?);
        }
        Ok(documents)
    }

    /// Values a unique index covers in a document, or `None` if any is absent.
    fn index_key(index: &IndexSpec, document: &Document) -> Option<Vec<Value>> {
        index
            .fields
            .names()
            .into_iter()
            .map(|field| document.get(field).cloned())
            .collect()
    }

    fn check_unique(
        &self,
        info: &CollectionInfo,
        document: &Document,
        existing: &[Document],
    ) -> Result<(), Error> {
        let unique = info
            .indexes
            .iter()
            .filter(|i| i.unique && i.kind == IndexKind::Hash);

        for index in unique {
            let Some(key) = Self::index_key(index, document) else {
                continue;
            };
            if existing
                .iter()
                .any(|other| Self::index_key(index, other).as_ref() == Some(&key))
            {
                return Err(Error::UniqueViolation {
                    collection: info.name.clone(),
                    index: index.name.clone(),
                    value: Value::Array(key).to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Database for SledDatabase {
    fn has_collection(&self, name: &str) -> Result<bool, Error> {
        Ok(self.collections.contains_key(name)?)
    }

    fn collections(&self) -> Result<Vec<CollectionInfo>, Error> {
        let mut result = Vec::new();
        for entry in self.collections.iter() {
            let (_, bytes) = entry?;
            result.push(serde_json::from_slice(&bytes)?);
        }
        Ok(result)
    }

    fn create_collection(
        &self,
        name: &str,
        kind: CollectionKind,
        schema: Option<&CollectionSchema>,
    ) -> Result<(), Error> {
        if self.has_collection(name)? {
            return Err(Error::CollectionExists(name.to_string()));
        }

        self.save_collection(&CollectionInfo {
            name: name.to_string(),
            kind,
            schema: schema.cloned(),
            indexes: Vec::new(),
        })?;
        self.docs_tree(name)?;

        debug!(collection = name, ?kind, "collection created");
        Ok(())
    }

    fn configure_schema(&self, name: &str, schema: &CollectionSchema) -> Result<(), Error> {
        let mut info = self.require_collection(name)?;
        info.schema = Some(schema.clone());
        self.save_collection(&info)
    }

    fn drop_collection(&self, name: &str, ignore_missing: bool) -> Result<bool, Error> {
        if self.collections.remove(name)?.is_none() {
            if ignore_missing {
                return Ok(false);
            }
            return Err(Error::CollectionNotFound(name.to_string()));
        }
        self.db.drop_tree(format!("{DOCS_PREFIX}{name}"))?;

        debug!(collection = name, "collection dropped");
        Ok(true)
    }

    fn indexes(&self, collection: &str) -> Result<Vec<IndexSpec>, Error> {
        Ok(self.require_collection(collection)?.indexes)
    }

    fn add_index(&self, collection: &str, index: &IndexSpec) -> Result<IndexSpec, Error> {
        let mut info = self.require_collection(collection)?;

        if let Some(existing) = info.indexes.iter().find(|i| i.name == index.name) {
            if existing == index {
                return Ok(existing.clone());
            }
            return Err(Error::IndexConflict {
                collection: collection.to_string(),
                name: index.name.clone(),
            });
        }

        if index.unique && index.kind == IndexKind::Hash {
            let documents = self.scan(collection)?;
            let probe = CollectionInfo {
                indexes: vec![index.clone()],
                ..info.clone()
            };
            for (i, document) in documents.iter().enumerate() {
                self.check_unique(&probe, document, &documents[..i])?;
            }
        }

        info.indexes.push(index.clone());
        self.save_collection(&info)?;

        debug!(collection, index = %index.name, kind = %index.kind, "index added");
        Ok(index.clone())
    }

    fn delete_index(
        &self,
        collection: &str,
        name: &str,
        ignore_missing: bool,
    ) -> Result<bool, Error> {
        let mut info = self.require_collection(collection)?;

        match info.indexes.iter().position(|i| i.name == name) {
            Some(pos) => {
                info.indexes.remove(pos);
                self.save_collection(&info)?;
                debug!(collection, index = name, "index deleted");
                Ok(true)
            }
            None if ignore_missing => Ok(false),
            None => Err(Error::IndexNotFound {
                collection: collection.to_string(),
                name: name.to_string(),
            }),
        }
    }

    fn has_graph(&self, name: &str) -> Result<bool, Error> {
        Ok(self.graphs.contains_key(name)?)
    }

    fn create_graph(&self, name: &str, edges: &[EdgeDefinition]) -> Result<(), Error> {
        for edge in edges {
            for vertex in edge
                .from_vertex_collections
                .iter()
                .chain(&edge.to_vertex_collections)
            {
                if !self.has_collection(vertex)? {
                    return Err(Error::CollectionNotFound(vertex.clone()));
                }
            }
        }

        for edge in edges {
            if !self.has_collection(&edge.edge_collection)? {
                self.create_collection(&edge.edge_collection, CollectionKind::Edge, None)?;
            }
        }

        let graph = GraphInfo {
            name: name.to_string(),
            edge_definitions: edges.to_vec(),
        };
        self.graphs.insert(name.as_bytes(), serde_json::to_vec(&graph)?)?;

        debug!(graph = name, edges = edges.len(), "graph created");
        Ok(())
    }

    fn drop_graph(&self, name: &str, ignore_missing: bool) -> Result<bool, Error> {
        if self.graphs.remove(name)?.is_some() {
            debug!(graph = name, "graph dropped");
            return Ok(true);
        }
        if ignore_missing {
            Ok(false)
        } else {
            Err(Error::GraphNotFound(name.to_string()))
        }
    }

    fn query(&self, query: &DocumentQuery) -> Result<Cursor, Error> {
        self.require_collection(&query.collection)?;

        let mut documents: Vec<Document> = self
            .scan(&query.collection)?
            .into_iter()
            .filter(|d| query.matches(d))
            .collect();

        if !query.sort.is_empty() {
            documents.sort_by(|a, b| query.compare(a, b));
        }
        if let Some(limit) = query.limit {
            documents.truncate(limit);
        }

        Ok(Cursor::new(documents))
    }

    fn insert(&self, collection: &str, mut document: Document) -> Result<Document, Error> {
        let info = self.require_collection(collection)?;

        if let Some(schema) = &info.schema {
            validate_document(collection, &document, schema)?;
        }

        let tree = self.docs_tree(collection)?;
        let key = match document.get("_key") {
            Some(Value::String(key)) => key.clone(),
            Some(other) => {
                return Err(Error::InvalidData(format!("_key must be a string, got {other}")));
            }
            None => self.db.generate_id()?.to_string(),
        };
        if tree.contains_key(&key)? {
            return Err(Error::UniqueViolation {
                collection: collection.to_string(),
                index: "primary".to_string(),
                value: key,
            });
        }

        if info.indexes.iter().any(|i| i.unique) {
            let existing = self.scan(collection)?;
            self.check_unique(&info, &document, &existing)?;
        }

        document.insert("_key".to_string(), Value::String(key.clone()));
        document.insert("_id".to_string(), Value::String(format!("{collection}/{key}")));

        tree.insert(key.as_bytes(), serde_json::to_vec(&document)?)?;
        Ok(document)
    }

    fn remove(&self, collection: &str, key: &str) -> Result<bool, Error> {
        self.require_collection(collection)?;
        let tree = self.docs_tree(collection)?;
        Ok(tree.remove(key)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDef, IndexFields, Level};
    use crate::schema::{PropertySchema, SchemaRule};
    use crate::storage::SortOrder;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn name_schema() -> CollectionSchema {
        let mut properties = BTreeMap::new();
        properties.insert(
            "name".to_string(),
            PropertySchema::for_field(&FieldDef::string("name")),
        );
        CollectionSchema {
            rule: SchemaRule {
                properties,
                additional_properties: false,
                required: vec!["name".to_string()],
            },
            level: Level::Strict,
        }
    }

    #[test]
    fn test_create_and_drop_collection() {
        let db = SledDatabase::temporary().unwrap();
        assert!(!db.has_collection("things").unwrap());

        db.create_collection("things", CollectionKind::Document, None)
            .unwrap();
        assert!(db.has_collection("things").unwrap());
        assert!(matches!(
            db.create_collection("things", CollectionKind::Document, None),
            Err(Error::CollectionExists(_))
        ));

        assert!(db.drop_collection("things", false).unwrap());
        assert!(!db.drop_collection("things", true).unwrap());
        assert!(db.drop_collection("things", false).unwrap_err().is_collection_not_found());
    }

    #[test]
    fn test_insert_assigns_key_and_validates() {
        let db = SledDatabase::temporary().unwrap();
        db.create_collection("people", CollectionKind::Document, Some(&name_schema()))
            .unwrap();

        let stored = db.insert("people", doc(json!({"name": "ann"}))).unwrap();
        let key = stored["_key"].as_str().unwrap().to_string();
        assert_eq!(stored["_id"], json!(format!("people/{key}")));

        let err = db.insert("people", doc(json!({"age": 3}))).unwrap_err();
        assert!(matches!(err, Error::SchemaViolation { .. }));

        assert!(db.remove("people", &key).unwrap());
        assert!(!db.remove("people", &key).unwrap());
    }

    #[test]
    fn test_unique_index_enforced() {
        let db = SledDatabase::temporary().unwrap();
        db.create_collection("people", CollectionKind::Document, None)
            .unwrap();
        db.add_index("people", &IndexSpec::field_hash("name_idx", "name", true))
            .unwrap();

        db.insert("people", doc(json!({"name": "ann"}))).unwrap();
        let err = db.insert("people", doc(json!({"name": "ann"}))).unwrap_err();
        assert!(matches!(err, Error::UniqueViolation { .. }));
        db.insert("people", doc(json!({"name": "bob"}))).unwrap();
    }

    #[test]
    fn test_add_index_idempotent_and_conflict() {
        let db = SledDatabase::temporary().unwrap();
        db.create_collection("things", CollectionKind::Document, None)
            .unwrap();

        let index = IndexSpec::field_hash("n_idx", "n", false);
        db.add_index("things", &index).unwrap();
        db.add_index("things", &index).unwrap();
        assert_eq!(db.indexes("things").unwrap().len(), 1);

        let conflicting = IndexSpec::field_hash("n_idx", "n", true);
        assert!(matches!(
            db.add_index("things", &conflicting),
            Err(Error::IndexConflict { .. })
        ));

        assert!(db.delete_index("things", "n_idx", false).unwrap());
        assert!(!db.delete_index("things", "n_idx", true).unwrap());
        assert!(matches!(
            db.delete_index("things", "n_idx", false),
            Err(Error::IndexNotFound { .. })
        ));
    }

    #[test]
    fn test_unique_index_rejects_existing_duplicates() {
        let db = SledDatabase::temporary().unwrap();
        db.create_collection("things", CollectionKind::Document, None)
            .unwrap();
        db.insert("things", doc(json!({"n": 1}))).unwrap();
        db.insert("things", doc(json!({"n": 1}))).unwrap();

        let index = IndexSpec {
            name: "n_idx".to_string(),
            kind: IndexKind::Hash,
            fields: IndexFields::List(vec!["n".to_string()]),
            unique: true,
            expiry_seconds: None,
        };
        assert!(matches!(
            db.add_index("things", &index),
            Err(Error::UniqueViolation { .. })
        ));
    }

    #[test]
    fn test_query_filter_sort_limit() {
        let db = SledDatabase::temporary().unwrap();
        db.create_collection("things", CollectionKind::Document, None)
            .unwrap();
        for (group, n) in [("a", 3), ("a", 1), ("b", 2), ("a", 2)] {
            db.insert("things", doc(json!({"group": group, "n": n})))
                .unwrap();
        }

        let query = DocumentQuery::new("things")
            .filter_eq("group", "a")
            .sort_by("n", SortOrder::Desc)
            .limit(2);
        let ns: Vec<i64> = db
            .query(&query)
            .unwrap()
            .map(|d| d["n"].as_i64().unwrap())
            .collect();
        assert_eq!(ns, vec![3, 2]);

        let missing = db.query(&DocumentQuery::new("nope")).unwrap_err();
        assert!(missing.is_collection_not_found());
    }

    #[test]
    fn test_graph_lifecycle() {
        let db = SledDatabase::temporary().unwrap();
        let edges = vec![EdgeDefinition {
            edge_collection: "a__b".to_string(),
            from_vertex_collections: vec!["a".to_string()],
            to_vertex_collections: vec!["b".to_string()],
        }];

        assert!(db.create_graph("g", &edges).unwrap_err().is_collection_not_found());

        db.create_collection("a", CollectionKind::Document, None).unwrap();
        db.create_collection("b", CollectionKind::Document, None).unwrap();
        db.create_graph("g", &edges).unwrap();

        assert!(db.has_graph("g").unwrap());
        assert_eq!(db.graph("g").unwrap(), Some(edges));
        assert_eq!(
            db.collection("a__b").unwrap().map(|c| c.kind),
            Some(CollectionKind::Edge)
        );

        assert!(db.drop_graph("g", false).unwrap());
        assert!(!db.drop_graph("g", true).unwrap());
        assert!(matches!(db.drop_graph("g", false), Err(Error::GraphNotFound(_))));
        assert!(db.has_collection("a__b").unwrap());
    }

    #[test]
    fn test_clean_removes_existing_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::new(dir.path(), "testdb");
        {
            let db = SledDatabase::open(&config).unwrap();
            db.create_collection("things", CollectionKind::Document, None)
                .unwrap();
            db.flush().unwrap();
        }
        {
            let db = SledDatabase::open(&config).unwrap();
            assert!(db.has_collection("things").unwrap());
        }
        let db = SledDatabase::open(&config.with_clean(true)).unwrap();
        assert!(!db.has_collection("things").unwrap());
    }
}

//! Test fixtures and database helpers.
//!
//! Provides sample vertex, edge and graph types and a database wired to an
//! in-memory store with keys, prefixes and locks configured.

use docgraph_core::{
    uuid_key_generator, Config, CoreResult, Database, DocumentMeta, EdgeMeta, EdgeSpec, Endpoint,
    Graph, Model, RecordKind, SaveContext, StoreLockBackend, Timestamps,
};
use docgraph_store::InMemoryStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

macro_rules! vertex {
    ($ty:ty) => {
        impl Model for $ty {
            fn meta(&self) -> &DocumentMeta {
                &self.meta
            }
            fn meta_mut(&mut self) -> &mut DocumentMeta {
                &mut self.meta
            }
        }
    };
}

macro_rules! edge {
    ($ty:ty) => {
        impl Model for $ty {
            const KIND: RecordKind = RecordKind::Edge;

            fn meta(&self) -> &DocumentMeta {
                &self.meta
            }
            fn meta_mut(&mut self) -> &mut DocumentMeta {
                &mut self.meta
            }
            fn edge(&self) -> Option<&EdgeMeta> {
                Some(&self.edge)
            }
        }
    };
}

/// A minimal named document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Store metadata.
    #[serde(flatten)]
    pub meta: DocumentMeta,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Free-form payload.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl Identity {
    /// Creates a transient identity.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates a transient identity carrying `data`.
    pub fn with_data(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
            ..Self::default()
        }
    }
}

vertex!(Identity);

/// A plain nested value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubModel {
    /// Free text.
    #[serde(default)]
    pub text: String,
}

/// An identity with optional extras, stored in `ext_identities`.
///
/// Saving with an `override_extra` context value replaces `extra`. Every
/// save stamps the creation and update times.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedIdentity {
    /// Store metadata.
    #[serde(flatten)]
    pub meta: DocumentMeta,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Optional extra text.
    #[serde(default)]
    pub extra: Option<String>,
    /// Optional nested value.
    #[serde(default)]
    pub sub: Option<SubModel>,
    /// Save times.
    #[serde(flatten)]
    pub times: Timestamps,
}

impl ExtendedIdentity {
    /// Creates a transient extended identity.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Model for ExtendedIdentity {
    fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut DocumentMeta {
        &mut self.meta
    }

    fn collection_name() -> Option<&'static str> {
        Some("ext_identities")
    }

    fn before_save(&mut self, _new: bool, ctx: &SaveContext) -> CoreResult<()> {
        self.times.touch();
        if let Some(extra) = ctx.get_str("override_extra") {
            self.extra = Some(extra.to_string());
        }
        Ok(())
    }
}

/// A typed edge between any two documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    /// Store metadata.
    #[serde(flatten)]
    pub meta: DocumentMeta,
    /// Endpoints.
    #[serde(flatten)]
    pub edge: EdgeMeta,
    /// Link type.
    #[serde(rename = "type")]
    pub link_type: String,
}

impl Link {
    /// Creates a transient link.
    pub fn new(from: impl Into<Endpoint>, to: impl Into<Endpoint>, link_type: &str) -> Self {
        Self {
            meta: DocumentMeta::default(),
            edge: EdgeMeta::new(from, to),
            link_type: link_type.to_string(),
        }
    }
}

edge!(Link);

/// A person vertex.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Store metadata.
    #[serde(flatten)]
    pub meta: DocumentMeta,
    /// Full name.
    pub name: String,
}

impl Person {
    /// Creates a transient person.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

vertex!(Person);

/// A relation between two people.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    /// Store metadata.
    #[serde(flatten)]
    pub meta: DocumentMeta,
    /// Endpoints.
    #[serde(flatten)]
    pub edge: EdgeMeta,
    /// Relation kind.
    pub kind: String,
}

impl Relation {
    /// Creates a transient relation.
    pub fn new(from: impl Into<Endpoint>, to: impl Into<Endpoint>, kind: &str) -> Self {
        Self {
            meta: DocumentMeta::default(),
            edge: EdgeMeta::new(from, to),
            kind: kind.to_string(),
        }
    }
}

edge!(Relation);

/// A second kind of relation, kept in its own graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecondaryRelation {
    /// Store metadata.
    #[serde(flatten)]
    pub meta: DocumentMeta,
    /// Endpoints.
    #[serde(flatten)]
    pub edge: EdgeMeta,
    /// Relation kind.
    pub kind: String,
}

impl SecondaryRelation {
    /// Creates a transient secondary relation.
    pub fn new(from: impl Into<Endpoint>, to: impl Into<Endpoint>, kind: &str) -> Self {
        Self {
            meta: DocumentMeta::default(),
            edge: EdgeMeta::new(from, to),
            kind: kind.to_string(),
        }
    }
}

edge!(SecondaryRelation);

/// People connected by [`Relation`] edges.
#[derive(Debug)]
pub struct RelationGraph;

impl Graph for RelationGraph {
    fn edge_definitions() -> Vec<EdgeSpec> {
        vec![EdgeSpec::new::<Relation>().from::<Person>().to::<Person>()]
    }
}

/// People connected by [`SecondaryRelation`] edges.
#[derive(Debug)]
pub struct SecondaryRelationGraph;

impl Graph for SecondaryRelationGraph {
    fn edge_definitions() -> Vec<EdgeSpec> {
        vec![EdgeSpec::new::<SecondaryRelation>()
            .from::<Person>()
            .to::<Person>()]
    }
}

/// A test database over a fresh in-memory store.
///
/// Collection and graph names carry a random `test-<id>-` prefix, vertex
/// keys are random UUIDs and named locks live in a `<prefix>locks`
/// collection of the same store.
pub struct TestDatabase {
    /// The database instance.
    pub db: Database,
    /// The store behind `db`.
    pub store: Arc<InMemoryStore>,
}

impl TestDatabase {
    /// Creates a fully configured test database.
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let prefix = format!("test-{}-", &uuid::Uuid::new_v4().simple().to_string()[..10]);
        let locks = StoreLockBackend::create_in(store.clone(), format!("{}locks", prefix))
            .expect("Failed to prepare lock collection");
        let config = Config::new()
            .prefix(prefix)
            .key_generator(uuid_key_generator())
            .lock_backend(Arc::new(locks));
        Self::with_config(store, config)
    }

    /// Creates a test database with an explicit configuration.
    pub fn with_config(store: Arc<InMemoryStore>, config: Config) -> Self {
        Self {
            db: Database::with_config(store.clone(), config),
            store,
        }
    }

    /// Creates a test database with default configuration: no prefix,
    /// store-assigned keys and no lock backend.
    pub fn plain() -> Self {
        Self::with_config(Arc::new(InMemoryStore::new()), Config::default())
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Runs a test with a temporary in-memory database.
///
/// # Example
///
/// ```rust,ignore
/// use docgraph_testkit::with_temp_db;
///
/// #[test]
/// fn my_test() {
///     with_temp_db(|db| {
///         db.collection::<Identity>().ensure_collection().unwrap();
///         // ... test operations
///     });
/// }
/// ```
pub fn with_temp_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database) -> R,
{
    let test_db = TestDatabase::new();
    f(&test_db.db)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a database with an `Identity` collection holding one record
    /// per name.
    pub fn identities(names: &[&str]) -> (TestDatabase, Vec<Identity>) {
        let test_db = TestDatabase::new();
        let collection = test_db.collection::<Identity>();
        collection
            .ensure_collection()
            .expect("Failed to create collection");

        let records = names
            .iter()
            .map(|name| {
                let mut record = Identity::new(*name);
                collection
                    .save(&mut record, &SaveContext::new())
                    .expect("Failed to save identity");
                record
            })
            .collect();
        (test_db, records)
    }

    /// Creates a database with [`RelationGraph`] and one saved person per
    /// name.
    pub fn people_graph(names: &[&str]) -> (TestDatabase, Vec<Person>) {
        let test_db = TestDatabase::new();
        let graph = test_db.graph::<RelationGraph>();
        graph.ensure().expect("Failed to create graph");

        let people = names
            .iter()
            .map(|name| {
                let mut person = Person::new(*name);
                graph
                    .save(&mut person, &SaveContext::new())
                    .expect("Failed to save person");
                person
            })
            .collect();
        (test_db, people)
    }
}

//! Database facade.

use crate::collection::Collection;
use crate::config::Config;
use crate::graph::{Graph, GraphHandle};
use crate::model::Model;
use crate::names::NameRegistry;
use docgraph_store::DocumentStore;
use std::fmt;
use std::sync::Arc;

/// The main database handle.
///
/// `Database` binds a [`DocumentStore`] to a [`Config`] and hands out typed
/// collection and graph handles. It is cheap to share behind an `Arc`; the
/// only state it mutates is the name memo.
///
/// # Example
///
/// ```rust,ignore
/// use docgraph_core::{Config, Database, SaveContext};
/// use docgraph_store::InMemoryStore;
/// use std::sync::Arc;
///
/// let db = Database::with_config(Arc::new(InMemoryStore::new()), Config::new().prefix("app_"));
/// let people = db.collection::<Person>();
/// people.ensure_collection()?;
///
/// let mut alice = Person::new("Alice");
/// people.save(&mut alice, &SaveContext::new())?;
/// ```
pub struct Database {
    /// The underlying store.
    store: Arc<dyn DocumentStore>,
    /// Configuration.
    config: Config,
    /// Resolved collection and graph names.
    names: NameRegistry,
}

impl Database {
    /// Creates a database with the default configuration.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_config(store, Config::default())
    }

    /// Creates a database with the given configuration.
    pub fn with_config(store: Arc<dyn DocumentStore>, config: Config) -> Self {
        let names = NameRegistry::new(
            config.prefix.clone(),
            config.collection_namer,
            config.graph_namer,
        );
        Self {
            store,
            config,
            names,
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the name registry.
    pub fn names(&self) -> &NameRegistry {
        &self.names
    }

    /// Returns the collection handle for record type `T`.
    pub fn collection<T: Model>(&self) -> Collection<'_, T> {
        Collection::new(self)
    }

    /// Returns the handle of graph type `G`.
    pub fn graph<G: Graph>(&self) -> GraphHandle<'_, G> {
        GraphHandle::new(self)
    }

    /// Returns the `collection/key` identifier of a record, `None` while it
    /// has no key.
    pub fn identifier<T: Model>(&self, record: &T) -> Option<String> {
        record
            .key()
            .map(|key| format!("{}/{}", self.names.collection::<T>(), key))
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("config", &self.config)
            .field("names", &self.names)
            .finish_non_exhaustive()
    }
}

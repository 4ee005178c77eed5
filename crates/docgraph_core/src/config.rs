//! Database configuration.

use crate::lock::LockBackend;
use crate::names::{pluralize_underscore, underscore, Namer};
use std::fmt;
use std::sync::Arc;

/// A function producing new primary keys.
pub type KeyGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Default prefix of lock names.
pub const DEFAULT_LOCK_NAME_PREFIX: &str = "docgraph_";

/// Returns a key generator producing random UUIDs.
pub fn uuid_key_generator() -> KeyGenerator {
    Arc::new(|| uuid::Uuid::new_v4().to_string())
}

/// Configuration for a [`Database`](crate::Database).
///
/// Built once and read for the lifetime of the database.
#[derive(Clone)]
pub struct Config {
    /// Prefix prepended to every collection and graph name.
    pub prefix: String,

    /// Generator for vertex keys. When `None` the store assigns keys.
    pub key_generator: Option<KeyGenerator>,

    /// Derives a collection name from a record type name.
    pub collection_namer: Namer,

    /// Derives a graph name from a graph type name.
    pub graph_namer: Namer,

    /// Backend for named locks. Locking fails without one.
    pub lock_backend: Option<Arc<dyn LockBackend>>,

    /// Prefix of every lock name.
    pub lock_name_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            key_generator: None,
            collection_namer: pluralize_underscore,
            graph_namer: underscore,
            lock_backend: None,
            lock_name_prefix: DEFAULT_LOCK_NAME_PREFIX.to_string(),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the collection and graph name prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the key generator.
    #[must_use]
    pub fn key_generator(mut self, generator: KeyGenerator) -> Self {
        self.key_generator = Some(generator);
        self
    }

    /// Sets the collection namer.
    #[must_use]
    pub fn collection_namer(mut self, namer: Namer) -> Self {
        self.collection_namer = namer;
        self
    }

    /// Sets the graph namer.
    #[must_use]
    pub fn graph_namer(mut self, namer: Namer) -> Self {
        self.graph_namer = namer;
        self
    }

    /// Sets the lock backend.
    #[must_use]
    pub fn lock_backend(mut self, backend: Arc<dyn LockBackend>) -> Self {
        self.lock_backend = Some(backend);
        self
    }

    /// Sets the lock name prefix.
    #[must_use]
    pub fn lock_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.lock_name_prefix = prefix.into();
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("prefix", &self.prefix)
            .field("key_generator", &self.key_generator.is_some())
            .field("lock_backend", &self.lock_backend.is_some())
            .field("lock_name_prefix", &self.lock_name_prefix)
            .finish_non_exhaustive()
    }
}

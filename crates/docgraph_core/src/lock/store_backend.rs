//! Lock backend keeping one document per held lock.

use super::LockBackend;
use crate::cursor::Cursor;
use crate::error::{CoreError, CoreResult};
use crate::model::{DocumentMeta, Model};
use docgraph_store::{
    codes, BindVars, CollectionOptions, Document, DocumentStore, IndexSpec, Query,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Default collection holding lock documents.
pub const DEFAULT_LOCK_COLLECTION: &str = "docgraph_locks";

/// How long a lock document stays valid for stores that reap expired ones.
pub const LOCK_TTL: Duration = Duration::from_secs(300);

/// Delay between attempts of a blocking acquisition.
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_micros(62_500);

const RELEASE_QUERY: &str = "FOR l IN @@collection\n    FILTER l.name == @name\n    RETURN l";

#[derive(Debug, Serialize, Deserialize)]
struct LockDocument {
    #[serde(flatten)]
    meta: DocumentMeta,
    name: String,
    #[serde(rename = "expiresAt")]
    expires_at: u64,
}

impl Model for LockDocument {
    fn meta(&self) -> &DocumentMeta {
        &self.meta
    }
    fn meta_mut(&mut self) -> &mut DocumentMeta {
        &mut self.meta
    }
}

/// A [`LockBackend`] over any [`DocumentStore`].
///
/// Holding a lock means owning the only document with its name in the
/// lock collection, which carries a unique index on `name`.
pub struct StoreLockBackend {
    store: Arc<dyn DocumentStore>,
    collection: String,
    poll_delay: Duration,
}

impl StoreLockBackend {
    /// Prepares the default lock collection and returns a backend using it.
    pub fn create(store: Arc<dyn DocumentStore>) -> CoreResult<Self> {
        Self::create_in(store, DEFAULT_LOCK_COLLECTION)
    }

    /// Prepares `collection` for locks and returns a backend using it.
    pub fn create_in(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> CoreResult<Self> {
        let collection = collection.into();
        if !store.has_collection(&collection)? {
            match store.create_collection(&collection, &CollectionOptions::default()) {
                Ok(()) => {}
                Err(err) if err.has_code(codes::DUPLICATE_NAME) => {}
                Err(err) => return Err(err.into()),
            }
        }
        store.ensure_index(&collection, &IndexSpec::unique(["name"]))?;
        debug!(collection = %collection, "prepared lock collection");

        Ok(Self {
            store,
            collection,
            poll_delay: DEFAULT_POLL_DELAY,
        })
    }

    /// Sets the delay between attempts of a blocking acquisition.
    #[must_use]
    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    /// Returns the lock collection.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn lock_document(name: &str) -> CoreResult<Document> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| CoreError::config(format!("system clock before epoch: {}", err)))?;
        let document = LockDocument {
            meta: DocumentMeta::default(),
            name: name.to_string(),
            expires_at: (now + LOCK_TTL).as_secs(),
        };
        match serde_json::to_value(&document)? {
            Value::Object(mut map) => {
                map.remove("_rev");
                Ok(map)
            }
            _ => Err(CoreError::invalid_record("lock document is not an object")),
        }
    }
}

impl LockBackend for StoreLockBackend {
    fn acquire(&self, name: &str, block: bool) -> CoreResult<bool> {
        loop {
            let document = Self::lock_document(name)?;
            match self.store.insert(&self.collection, document) {
                Ok(_) => return Ok(true),
                Err(err)
                    if err.has_code(codes::UNIQUE_CONSTRAINT_VIOLATED)
                        || err.has_code(codes::CONFLICT) =>
                {
                    if !block {
                        return Ok(false);
                    }
                    thread::sleep(self.poll_delay);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn release(&self, name: &str) -> CoreResult<()> {
        let mut bind_vars = BindVars::new();
        bind_vars.insert("@collection".into(), json!(self.collection));
        bind_vars.insert("name".into(), json!(name));

        let batch = self.store.execute(&Query::new(RELEASE_QUERY, bind_vars))?;
        let mut held = Cursor::<LockDocument>::new(self.store.as_ref(), batch);
        for document in held.to_list()? {
            if let Some(key) = document.key() {
                self.store.delete(&self.collection, key, None, true)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for StoreLockBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreLockBackend")
            .field("collection", &self.collection)
            .field("poll_delay", &self.poll_delay)
            .finish_non_exhaustive()
    }
}

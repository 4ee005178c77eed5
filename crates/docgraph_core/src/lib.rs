//! # docgraph Core
//!
//! Typed records over a document/graph store.
//!
//! This crate provides:
//! - Record persistence with revision tracking (`Collection<T>`)
//! - A filter and sort compiler producing bind-variable queries
//! - Lazy result cursors
//! - Named graphs with cascading vertex deletion
//! - Per-record named locks
//!
//! ## Example
//!
//! ```rust,ignore
//! use docgraph_core::query::{Filters, FindOptions, Sort};
//! use docgraph_core::{Config, Database, SaveContext, StoreLockBackend};
//! use docgraph_store::InMemoryStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryStore::new());
//! let locks = Arc::new(StoreLockBackend::create(store.clone())?);
//! let db = Database::with_config(store, Config::new().lock_backend(locks));
//!
//! let identities = db.collection::<Identity>();
//! identities.ensure_collection()?;
//! identities.save(&mut alice, &SaveContext::new())?;
//!
//! let adults = identities
//!     .find(&FindOptions::new()
//!         .filters(Filters::new().op("age", ">=", 18))
//!         .sort(Sort::new().asc("name")))?
//!     .to_list()?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod config;
mod cursor;
mod database;
mod error;
mod graph;
mod lock;
mod model;
mod names;
pub mod query;

pub use collection::Collection;
pub use config::{uuid_key_generator, Config, KeyGenerator, DEFAULT_LOCK_NAME_PREFIX};
pub use cursor::{CloseOutcome, Cursor};
pub use database::Database;
pub use error::{CoreError, CoreResult};
pub use graph::{orphan, EdgeSpec, Graph, GraphHandle};
pub use lock::{
    LockBackend, LockGuard, Locked, NamedLock, StoreLockBackend, DEFAULT_LOCK_COLLECTION,
    DEFAULT_POLL_DELAY, LOCK_TTL,
};
pub use model::{
    DocumentMeta, EdgeMeta, Endpoint, LinkedVertex, Model, RecordKind, SaveContext, Timestamps,
};
pub use names::{
    collection_of, pluralize_underscore, short_type_name, underscore, CollectionRef, NameRegistry,
    Namer,
};

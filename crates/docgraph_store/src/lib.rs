//! # docgraph Store
//!
//! Document store contract for docgraph.
//!
//! This crate defines the boundary between docgraph and the document/graph
//! store it maps records onto. The store is the system of record: it owns
//! keys, revisions, unique indexes, query execution and server-side cursors.
//! docgraph itself only compiles queries, builds documents and classifies
//! the store's numeric error codes.
//!
//! ## Store Contract
//!
//! - Documents are JSON objects carrying `_key`, `_id` and `_rev`
//! - Edge documents additionally carry `_from` and `_to` identifiers
//! - Failures carry a numeric error code (see [`codes`])
//! - Stores are `Send + Sync` and called synchronously
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and ephemeral databases

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod memory;
mod types;

pub use backend::DocumentStore;
pub use error::{codes, StoreError, StoreResult};
pub use memory::{InMemoryStore, DEFAULT_BATCH_SIZE};
pub use types::{
    BindVars, CollectionKind, CollectionOptions, CursorBatch, Document, DocumentHeader,
    EdgeDefinition, GraphDefinition, IndexSpec, Query, QueryOptions, FROM_FIELD, ID_FIELD,
    KEY_FIELD, REV_FIELD, TO_FIELD,
};

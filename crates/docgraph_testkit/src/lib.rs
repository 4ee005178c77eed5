//! # docgraph Testkit
//!
//! Test utilities for docgraph.
//!
//! This crate provides:
//! - Sample vertex, edge and graph types
//! - Test databases over the in-memory store
//! - Property-based test generators using proptest
//! - Cross-crate integration tests (under `tests/`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docgraph_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_database() {
//!     with_temp_db(|db| {
//!         let identities = db.collection::<Identity>();
//!         identities.ensure_collection().unwrap();
//!         // ... test operations
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use docgraph_core::query::{Filters, FindOptions, Operand, Operator, Sort};
    pub use docgraph_core::{
        CloseOutcome, CoreError, Database, DocumentMeta, Endpoint, Model, SaveContext,
    };
}

pub use fixtures::*;
pub use generators::*;

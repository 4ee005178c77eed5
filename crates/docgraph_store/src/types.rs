//! Value types exchanged with a document store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A raw JSON document as stored in a collection.
pub type Document = Map<String, Value>;

/// Bind variables for a query, keyed by variable name (without the `@`).
///
/// Collection bind variables carry a leading `@` in their name
/// (`"@collection"` binds `@@collection`).
pub type BindVars = Map<String, Value>;

/// System attribute holding the document key.
pub const KEY_FIELD: &str = "_key";
/// System attribute holding the document identifier (`collection/key`).
pub const ID_FIELD: &str = "_id";
/// System attribute holding the document revision.
pub const REV_FIELD: &str = "_rev";
/// System attribute holding an edge's source vertex identifier.
pub const FROM_FIELD: &str = "_from";
/// System attribute holding an edge's target vertex identifier.
pub const TO_FIELD: &str = "_to";

/// Identity of a document after a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHeader {
    /// The `collection/key` identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// The primary key.
    #[serde(rename = "_key")]
    pub key: String,
    /// The revision created by the write.
    #[serde(rename = "_rev")]
    pub rev: String,
}

/// The kind of documents a collection holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionKind {
    /// Plain documents (graph vertices).
    #[default]
    Document,
    /// Edge documents carrying `_from` and `_to`.
    Edge,
}

/// Options used when creating a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionOptions {
    /// Document or edge collection.
    pub kind: CollectionKind,
    /// Whether callers may supply their own `_key` values.
    pub user_keys: bool,
}

impl Default for CollectionOptions {
    fn default() -> Self {
        Self {
            kind: CollectionKind::Document,
            user_keys: true,
        }
    }
}

impl CollectionOptions {
    /// Options for an edge collection with store-assigned keys.
    #[must_use]
    pub fn edge() -> Self {
        Self {
            kind: CollectionKind::Edge,
            user_keys: false,
        }
    }
}

/// A secondary index definition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexSpec {
    /// Indexed attribute paths (dot separated).
    pub fields: Vec<String>,
    /// Whether indexed values must be unique across the collection.
    pub unique: bool,
    /// Whether documents with a missing or null indexed value are skipped.
    pub sparse: bool,
    /// Optional index name.
    pub name: Option<String>,
}

impl IndexSpec {
    /// Creates a unique persistent index on the given fields.
    pub fn unique<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            unique: true,
            ..Self::default()
        }
    }

    /// Marks the index as sparse.
    #[must_use]
    pub fn sparse(mut self) -> Self {
        self.sparse = true;
        self
    }
}

/// Execution options for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryOptions {
    /// Include the total number of result documents in the first batch.
    pub count: bool,
    /// Report how many documents matched before the final `LIMIT`.
    pub full_count: bool,
    /// Maximum number of documents per batch (store default when `None`).
    pub batch_size: Option<usize>,
}

/// A query statement with its bind variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// The query text.
    pub text: String,
    /// Values for the `@name` / `@@name` placeholders in `text`.
    pub bind_vars: BindVars,
    /// Execution options.
    pub options: QueryOptions,
}

impl Query {
    /// Creates a query with default options.
    pub fn new(text: impl Into<String>, bind_vars: BindVars) -> Self {
        Self {
            text: text.into(),
            bind_vars,
            options: QueryOptions::default(),
        }
    }

    /// Sets the execution options.
    #[must_use]
    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CursorBatch {
    /// Server-side cursor id, present when the store kept a cursor open.
    pub id: Option<String>,
    /// The documents in this batch.
    pub items: Vec<Value>,
    /// Whether further batches can be fetched with the cursor id.
    pub has_more: bool,
    /// Total number of results, when `count` was requested.
    pub count: Option<usize>,
    /// Matches before `LIMIT`, when `full_count` was requested.
    pub full_count: Option<usize>,
}

/// An edge definition with resolved collection names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDefinition {
    /// The edge collection.
    pub edge_collection: String,
    /// Collections allowed as `_from`.
    pub from_vertex_collections: Vec<String>,
    /// Collections allowed as `_to`.
    pub to_vertex_collections: Vec<String>,
}

impl EdgeDefinition {
    /// Returns true if `collection` may appear on either side of this edge.
    pub fn touches(&self, collection: &str) -> bool {
        self.from_vertex_collections.iter().any(|c| c == collection)
            || self.to_vertex_collections.iter().any(|c| c == collection)
    }
}

/// A named graph with resolved collection names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDefinition {
    /// The graph name.
    pub name: String,
    /// Edge definitions.
    pub edge_definitions: Vec<EdgeDefinition>,
    /// Vertex collections not referenced by any edge definition.
    pub orphan_collections: Vec<String>,
}

impl GraphDefinition {
    /// Returns true if `collection` is a vertex collection of this graph.
    pub fn has_vertex_collection(&self, collection: &str) -> bool {
        self.orphan_collections.iter().any(|c| c == collection)
            || self.edge_definitions.iter().any(|d| d.touches(collection))
    }

    /// Returns the edge definition for `collection`, if it is an edge collection of this graph.
    pub fn edge_definition(&self, collection: &str) -> Option<&EdgeDefinition> {
        self.edge_definitions
            .iter()
            .find(|d| d.edge_collection == collection)
    }

    /// Returns every collection used by this graph, edge collections first.
    pub fn collections(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let mut push = |name: &String| {
            if !names.contains(name) {
                names.push(name.clone());
            }
        };
        for def in &self.edge_definitions {
            push(&def.edge_collection);
        }
        for def in &self.edge_definitions {
            def.from_vertex_collections.iter().for_each(&mut push);
            def.to_vertex_collections.iter().for_each(&mut push);
        }
        self.orphan_collections.iter().for_each(&mut push);
        names
    }
}

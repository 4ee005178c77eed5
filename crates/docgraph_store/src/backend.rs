//! Document store trait definition.

use crate::error::StoreResult;
use crate::types::{
    CollectionOptions, CursorBatch, Document, DocumentHeader, GraphDefinition, IndexSpec, Query,
};

/// A document/graph store holding JSON documents in named collections.
///
/// The store is the system of record: it assigns keys and revisions,
/// enforces unique indexes, checks presented revisions on writes, and
/// executes queries. Record mapping, query compilation and error
/// classification live above this trait.
///
/// # Invariants
///
/// - Every successful write returns the document's new `_rev`
/// - A write presenting a non-empty `_rev` that differs from the stored
///   revision fails with [`codes::CONFLICT`](crate::codes::CONFLICT)
/// - Failures carry the store's numeric error code
///   (see [`codes`](crate::codes))
/// - Stores must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - Reference store for testing
pub trait DocumentStore: Send + Sync {
    /// Returns true if the collection exists.
    fn has_collection(&self, name: &str) -> StoreResult<bool>;

    /// Creates a collection.
    ///
    /// # Errors
    ///
    /// Fails with `DUPLICATE_NAME` if the collection already exists.
    fn create_collection(&self, name: &str, options: &CollectionOptions) -> StoreResult<()>;

    /// Drops a collection.
    ///
    /// Returns false if the collection did not exist and `ignore_missing`
    /// is set; otherwise a missing collection fails with
    /// `DATA_SOURCE_NOT_FOUND`.
    fn delete_collection(&self, name: &str, ignore_missing: bool) -> StoreResult<bool>;

    /// Removes every document from a collection.
    fn truncate_collection(&self, name: &str) -> StoreResult<()>;

    /// Returns the number of documents in a collection.
    fn count(&self, collection: &str) -> StoreResult<usize>;

    /// Creates an index unless an identical one exists.
    fn ensure_index(&self, collection: &str, index: &IndexSpec) -> StoreResult<()>;

    /// Fetches a document by key, `None` if it does not exist.
    fn get(&self, collection: &str, key: &str) -> StoreResult<Option<Document>>;

    /// Fetches the documents for the given keys, skipping missing ones.
    fn get_many(&self, collection: &str, keys: &[String]) -> StoreResult<Vec<Document>> {
        let mut found = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(document) = self.get(collection, key)? {
                found.push(document);
            }
        }
        Ok(found)
    }

    /// Returns every key in a collection.
    fn keys(&self, collection: &str) -> StoreResult<Vec<String>>;

    /// Inserts a document. The store assigns `_key` when it is absent.
    fn insert(&self, collection: &str, document: Document) -> StoreResult<DocumentHeader>;

    /// Inserts several documents, reporting one result per document.
    ///
    /// A failed document does not stop the others.
    fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Vec<StoreResult<DocumentHeader>> {
        documents
            .into_iter()
            .map(|document| self.insert(collection, document))
            .collect()
    }

    /// Replaces the document addressed by the document's `_key`.
    fn replace(&self, collection: &str, document: Document) -> StoreResult<DocumentHeader>;

    /// Deletes a document.
    ///
    /// Returns false if the document did not exist and `ignore_missing` is
    /// set; otherwise a missing document fails with `DOCUMENT_NOT_FOUND`.
    fn delete(
        &self,
        collection: &str,
        key: &str,
        rev: Option<&str>,
        ignore_missing: bool,
    ) -> StoreResult<bool>;

    /// Executes a query and returns its first batch.
    fn execute(&self, query: &Query) -> StoreResult<CursorBatch>;

    /// Fetches the next batch of an open cursor.
    fn next_batch(&self, cursor_id: &str) -> StoreResult<CursorBatch>;

    /// Releases a server-side cursor.
    ///
    /// Fails with `CURSOR_NOT_FOUND` if the cursor is unknown, which
    /// includes cursors the store already released after exhaustion.
    fn close_cursor(&self, cursor_id: &str) -> StoreResult<()>;

    /// Returns true if the graph exists.
    fn has_graph(&self, name: &str) -> StoreResult<bool>;

    /// Creates a graph and any of its collections that do not exist yet.
    fn create_graph(&self, definition: &GraphDefinition) -> StoreResult<()>;

    /// Drops a graph, optionally dropping collections no other graph uses.
    fn delete_graph(
        &self,
        name: &str,
        ignore_missing: bool,
        drop_collections: bool,
    ) -> StoreResult<bool>;

    /// Inserts a vertex through a graph.
    fn insert_vertex(
        &self,
        graph: &str,
        collection: &str,
        document: Document,
    ) -> StoreResult<DocumentHeader>;

    /// Inserts an edge through a graph, validating both endpoints exist.
    fn insert_edge(
        &self,
        graph: &str,
        collection: &str,
        document: Document,
    ) -> StoreResult<DocumentHeader>;

    /// Replaces a vertex through a graph.
    fn replace_vertex(
        &self,
        graph: &str,
        collection: &str,
        document: Document,
    ) -> StoreResult<DocumentHeader>;

    /// Replaces an edge through a graph, validating both endpoints exist.
    fn replace_edge(
        &self,
        graph: &str,
        collection: &str,
        document: Document,
    ) -> StoreResult<DocumentHeader>;

    /// Deletes a vertex and every edge incident to it in all graphs that
    /// declare its collection.
    fn delete_vertex(
        &self,
        graph: &str,
        collection: &str,
        key: &str,
        rev: Option<&str>,
        ignore_missing: bool,
    ) -> StoreResult<bool>;

    /// Deletes an edge through a graph.
    fn delete_edge(
        &self,
        graph: &str,
        collection: &str,
        key: &str,
        rev: Option<&str>,
        ignore_missing: bool,
    ) -> StoreResult<bool>;
}

//! In-memory document store for testing.

mod query;
mod value;

use crate::backend::DocumentStore;
use crate::error::{codes, StoreError, StoreResult};
use crate::types::{
    CollectionKind, CollectionOptions, CursorBatch, Document, DocumentHeader, GraphDefinition,
    IndexSpec, Query, FROM_FIELD, ID_FIELD, KEY_FIELD, REV_FIELD, TO_FIELD,
};
use parking_lot::RwLock;
use query::Plan;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Default number of documents returned per cursor batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// An in-memory document/graph store.
///
/// This store keeps every collection, graph and open cursor in memory and
/// is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral databases that don't need persistence
///
/// It enforces the same contract a server would: keys and revisions are
/// assigned on write, presented revisions are checked, unique indexes are
/// enforced, and graph writes validate edge endpoints. Queries are limited
/// to the `FOR ... FILTER ... SORT ... LIMIT ... RETURN` shape emitted by
/// the docgraph query compiler.
///
/// # Thread Safety
///
/// All state sits behind a single `RwLock`; the store can be shared across
/// threads.
///
/// # Example
///
/// ```rust
/// use docgraph_store::{CollectionOptions, DocumentStore, InMemoryStore};
/// use serde_json::json;
///
/// let store = InMemoryStore::new();
/// store.create_collection("people", &CollectionOptions::default()).unwrap();
///
/// let doc = json!({"name": "Jane"}).as_object().unwrap().clone();
/// let header = store.insert("people", doc).unwrap();
/// assert_eq!(header.id, format!("people/{}", header.key));
/// assert_eq!(store.count("people").unwrap(), 1);
/// ```
#[derive(Debug)]
pub struct InMemoryStore {
    state: RwLock<State>,
    batch_size: usize,
}

#[derive(Debug, Default)]
struct State {
    collections: HashMap<String, CollectionState>,
    graphs: BTreeMap<String, GraphDefinition>,
    cursors: HashMap<String, PendingCursor>,
    next_key: u64,
    next_rev: u64,
}

#[derive(Debug)]
struct CollectionState {
    options: CollectionOptions,
    documents: Vec<(String, Document)>,
    indexes: Vec<IndexSpec>,
}

#[derive(Debug)]
struct PendingCursor {
    items: VecDeque<Value>,
    batch_size: usize,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_batch_size(DEFAULT_BATCH_SIZE)
    }

    /// Creates a new empty store with the given default cursor batch size.
    ///
    /// A batch size of zero is treated as one.
    #[must_use]
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            state: RwLock::new(State::default()),
            batch_size: batch_size.max(1),
        }
    }

    /// Returns the number of server-side cursors currently open.
    ///
    /// Useful for asserting that callers release their cursors.
    #[must_use]
    pub fn open_cursors(&self) -> usize {
        self.state.read().cursors.len()
    }
}

impl CollectionState {
    fn new(options: CollectionOptions) -> Self {
        Self {
            options,
            documents: Vec::new(),
            indexes: Vec::new(),
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.documents.iter().position(|(k, _)| k == key)
    }

    fn find(&self, key: &str) -> Option<&Document> {
        self.documents.iter().find(|(k, _)| k == key).map(|(_, d)| d)
    }

    /// Checks the unique indexes against `document`, ignoring the stored
    /// document with key `skip`.
    fn check_unique(&self, name: &str, document: &Document, skip: &str) -> StoreResult<()> {
        for index in self.indexes.iter().filter(|i| i.unique) {
            let Some(values) = index_values(index, document) else {
                continue;
            };
            let clash = self
                .documents
                .iter()
                .filter(|(k, _)| k != skip)
                .any(|(_, other)| index_values(index, other).as_ref() == Some(&values));
            if clash {
                return Err(StoreError::server(
                    codes::UNIQUE_CONSTRAINT_VIOLATED,
                    format!(
                        "unique constraint violated in collection '{}' on [{}]",
                        name,
                        index.fields.join(", ")
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// The indexed values of `document`, `None` when a sparse index skips it.
fn index_values(index: &IndexSpec, document: &Document) -> Option<Vec<Value>> {
    let root = Value::Object(document.clone());
    let values: Vec<Value> = index
        .fields
        .iter()
        .map(|field| {
            let path: Vec<String> = field.split('.').map(str::to_string).collect();
            value::lookup(&root, &path).clone()
        })
        .collect();
    if index.sparse && values.iter().any(Value::is_null) {
        return None;
    }
    Some(values)
}

fn string_field<'a>(document: &'a Document, field: &str) -> Option<&'a str> {
    document.get(field).and_then(Value::as_str)
}

fn presented_rev(document: &Document) -> Option<&str> {
    string_field(document, REV_FIELD).filter(|rev| !rev.is_empty())
}

fn split_id(id: &str) -> Option<(&str, &str)> {
    id.split_once('/')
        .filter(|(collection, key)| !collection.is_empty() && !key.is_empty())
}

fn header_of(document: &Document) -> DocumentHeader {
    let field = |name| string_field(document, name).unwrap_or_default().to_string();
    DocumentHeader {
        id: field(ID_FIELD),
        key: field(KEY_FIELD),
        rev: field(REV_FIELD),
    }
}

impl State {
    fn collection(&self, name: &str) -> StoreResult<&CollectionState> {
        self.collections
            .get(name)
            .ok_or_else(|| StoreError::collection_not_found(name))
    }

    fn collection_mut(&mut self, name: &str) -> StoreResult<&mut CollectionState> {
        self.collections
            .get_mut(name)
            .ok_or_else(|| StoreError::collection_not_found(name))
    }

    fn graph(&self, name: &str) -> StoreResult<&GraphDefinition> {
        self.graphs
            .get(name)
            .ok_or_else(|| StoreError::graph_not_found(name))
    }

    fn new_rev(&mut self) -> String {
        self.next_rev += 1;
        format!("_r{:08x}", self.next_rev)
    }

    fn new_key(&mut self, collection: &str) -> String {
        loop {
            self.next_key += 1;
            let key = self.next_key.to_string();
            let taken = self
                .collections
                .get(collection)
                .is_some_and(|c| c.position(&key).is_some());
            if !taken {
                return key;
            }
        }
    }

    fn check_edge_attributes(&self, collection: &str, document: &Document) -> StoreResult<()> {
        if self.collection(collection)?.options.kind != CollectionKind::Edge {
            return Ok(());
        }
        for field in [FROM_FIELD, TO_FIELD] {
            if string_field(document, field).and_then(split_id).is_none() {
                return Err(StoreError::server(
                    codes::INVALID_EDGE_ATTRIBUTE,
                    format!("edge attribute missing or invalid: {}", field),
                ));
            }
        }
        Ok(())
    }

    fn insert(&mut self, collection: &str, mut document: Document) -> StoreResult<DocumentHeader> {
        let user_keys = self.collection(collection)?.options.user_keys;
        self.check_edge_attributes(collection, &document)?;

        let key = match document.get(KEY_FIELD) {
            None | Some(Value::Null) => self.new_key(collection),
            Some(_) if !user_keys => {
                return Err(StoreError::server(
                    codes::DOCUMENT_KEY_UNEXPECTED,
                    format!("collection '{}' does not allow user defined keys", collection),
                ));
            }
            Some(Value::String(key)) if !key.is_empty() && !key.contains('/') => key.clone(),
            Some(other) => {
                return Err(StoreError::server(
                    codes::DOCUMENT_HANDLE_BAD,
                    format!("illegal document key: {}", other),
                ));
            }
        };

        let coll = self.collection(collection)?;
        if coll.position(&key).is_some() {
            return Err(StoreError::server(
                codes::UNIQUE_CONSTRAINT_VIOLATED,
                format!("unique constraint violated: {}/{} already exists", collection, key),
            ));
        }
        coll.check_unique(collection, &document, &key)?;

        let rev = self.new_rev();
        document.insert(KEY_FIELD.into(), Value::String(key.clone()));
        document.insert(ID_FIELD.into(), Value::String(format!("{}/{}", collection, key)));
        document.insert(REV_FIELD.into(), Value::String(rev));

        let header = header_of(&document);
        self.collection_mut(collection)?.documents.push((key, document));
        Ok(header)
    }

    fn replace(&mut self, collection: &str, mut document: Document) -> StoreResult<DocumentHeader> {
        let key = string_field(&document, KEY_FIELD)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                StoreError::server(codes::DOCUMENT_HANDLE_BAD, "replace requires a document key")
            })?;
        self.check_edge_attributes(collection, &document)?;

        let coll = self.collection(collection)?;
        let stored = coll
            .find(&key)
            .ok_or_else(|| StoreError::document_not_found(collection, &key))?;
        if let Some(rev) = presented_rev(&document) {
            if string_field(stored, REV_FIELD) != Some(rev) {
                return Err(StoreError::server(
                    codes::CONFLICT,
                    format!("conflict, _rev values do not match for {}/{}", collection, key),
                ));
            }
        }
        coll.check_unique(collection, &document, &key)?;

        let rev = self.new_rev();
        document.insert(ID_FIELD.into(), Value::String(format!("{}/{}", collection, key)));
        document.insert(REV_FIELD.into(), Value::String(rev));

        let header = header_of(&document);
        let coll = self.collection_mut(collection)?;
        if let Some(pos) = coll.position(&key) {
            coll.documents[pos].1 = document;
        }
        Ok(header)
    }

    fn delete(
        &mut self,
        collection: &str,
        key: &str,
        rev: Option<&str>,
        ignore_missing: bool,
    ) -> StoreResult<bool> {
        let coll = self.collection_mut(collection)?;
        let Some(pos) = coll.position(key) else {
            if ignore_missing {
                return Ok(false);
            }
            return Err(StoreError::document_not_found(collection, key));
        };
        if let Some(rev) = rev.filter(|rev| !rev.is_empty()) {
            if string_field(&coll.documents[pos].1, REV_FIELD) != Some(rev) {
                return Err(StoreError::server(
                    codes::CONFLICT,
                    format!("conflict, _rev values do not match for {}/{}", collection, key),
                ));
            }
        }
        coll.documents.remove(pos);
        Ok(true)
    }

    fn ensure_collection(&mut self, name: &str, options: CollectionOptions) {
        self.collections
            .entry(name.to_string())
            .or_insert_with(|| CollectionState::new(options));
    }

    /// Checks that both endpoints of an edge exist and belong to collections
    /// the graph's edge definition allows.
    fn check_edge_endpoints(
        &self,
        graph: &str,
        collection: &str,
        document: &Document,
    ) -> StoreResult<()> {
        let definition = self.graph(graph)?.edge_definition(collection).ok_or_else(|| {
            StoreError::server(
                codes::GRAPH_EDGE_COLLECTION_NOT_USED,
                format!("edge collection '{}' not used in graph '{}'", collection, graph),
            )
        })?;

        let sides = [
            (FROM_FIELD, &definition.from_vertex_collections),
            (TO_FIELD, &definition.to_vertex_collections),
        ];
        for (field, allowed) in sides {
            let (vertex_collection, key) = string_field(document, field)
                .and_then(split_id)
                .ok_or_else(|| {
                    StoreError::server(
                        codes::INVALID_EDGE_ATTRIBUTE,
                        format!("edge attribute missing or invalid: {}", field),
                    )
                })?;
            if !allowed.iter().any(|c| c == vertex_collection) {
                return Err(StoreError::server(
                    codes::GRAPH_REFERENCED_VERTEX_COLLECTION_NOT_USED,
                    format!(
                        "referenced vertex collection '{}' is not part of the edge definition",
                        vertex_collection
                    ),
                ));
            }
            let exists = self
                .collections
                .get(vertex_collection)
                .is_some_and(|c| c.position(key).is_some());
            if !exists {
                return Err(StoreError::document_not_found(vertex_collection, key));
            }
        }
        Ok(())
    }

    fn check_vertex_collection(&self, graph: &str, collection: &str) -> StoreResult<()> {
        if self.graph(graph)?.has_vertex_collection(collection) {
            return Ok(());
        }
        Err(StoreError::server(
            codes::GRAPH_VERTEX_COLLECTION_NOT_USED,
            format!("vertex collection '{}' not used in graph '{}'", collection, graph),
        ))
    }

    /// Removes every edge that points at or from `vertex_id` in the edge
    /// collections of graphs that declare `collection`.
    fn remove_incident_edges(&mut self, collection: &str, vertex_id: &str) {
        let edge_collections: Vec<String> = self
            .graphs
            .values()
            .flat_map(|g| g.edge_definitions.iter())
            .filter(|d| d.touches(collection))
            .map(|d| d.edge_collection.clone())
            .collect();

        for name in edge_collections {
            if let Some(coll) = self.collections.get_mut(&name) {
                coll.documents.retain(|(_, edge)| {
                    string_field(edge, FROM_FIELD) != Some(vertex_id)
                        && string_field(edge, TO_FIELD) != Some(vertex_id)
                });
            }
        }
    }
}

impl DocumentStore for InMemoryStore {
    fn has_collection(&self, name: &str) -> StoreResult<bool> {
        Ok(self.state.read().collections.contains_key(name))
    }

    fn create_collection(&self, name: &str, options: &CollectionOptions) -> StoreResult<()> {
        let mut state = self.state.write();
        if state.collections.contains_key(name) {
            return Err(StoreError::server(
                codes::DUPLICATE_NAME,
                format!("duplicate name: {}", name),
            ));
        }
        state
            .collections
            .insert(name.to_string(), CollectionState::new(options.clone()));
        Ok(())
    }

    fn delete_collection(&self, name: &str, ignore_missing: bool) -> StoreResult<bool> {
        let mut state = self.state.write();
        match state.collections.remove(name) {
            Some(_) => Ok(true),
            None if ignore_missing => Ok(false),
            None => Err(StoreError::collection_not_found(name)),
        }
    }

    fn truncate_collection(&self, name: &str) -> StoreResult<()> {
        self.state.write().collection_mut(name)?.documents.clear();
        Ok(())
    }

    fn count(&self, collection: &str) -> StoreResult<usize> {
        Ok(self.state.read().collection(collection)?.documents.len())
    }

    fn ensure_index(&self, collection: &str, index: &IndexSpec) -> StoreResult<()> {
        let mut state = self.state.write();
        let coll = state.collection_mut(collection)?;
        let exists = coll
            .indexes
            .iter()
            .any(|i| i.fields == index.fields && i.unique == index.unique && i.sparse == index.sparse);
        if exists {
            return Ok(());
        }

        if index.unique {
            let mut seen: Vec<Vec<Value>> = Vec::new();
            for (_, document) in &coll.documents {
                if let Some(values) = index_values(index, document) {
                    if seen.contains(&values) {
                        return Err(StoreError::server(
                            codes::UNIQUE_CONSTRAINT_VIOLATED,
                            format!(
                                "cannot create unique index on [{}]: duplicate values",
                                index.fields.join(", ")
                            ),
                        ));
                    }
                    seen.push(values);
                }
            }
        }
        coll.indexes.push(index.clone());
        Ok(())
    }

    fn get(&self, collection: &str, key: &str) -> StoreResult<Option<Document>> {
        Ok(self.state.read().collection(collection)?.find(key).cloned())
    }

    fn keys(&self, collection: &str) -> StoreResult<Vec<String>> {
        let state = self.state.read();
        Ok(state
            .collection(collection)?
            .documents
            .iter()
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn insert(&self, collection: &str, document: Document) -> StoreResult<DocumentHeader> {
        self.state.write().insert(collection, document)
    }

    fn replace(&self, collection: &str, document: Document) -> StoreResult<DocumentHeader> {
        self.state.write().replace(collection, document)
    }

    fn delete(
        &self,
        collection: &str,
        key: &str,
        rev: Option<&str>,
        ignore_missing: bool,
    ) -> StoreResult<bool> {
        self.state.write().delete(collection, key, rev, ignore_missing)
    }

    fn execute(&self, query: &Query) -> StoreResult<CursorBatch> {
        let plan = Plan::parse(&query.text)?;
        let mut state = self.state.write();

        let collection = plan.collection(&query.bind_vars)?;
        let documents: Vec<Value> = state
            .collection(&collection)?
            .documents
            .iter()
            .map(|(_, d)| Value::Object(d.clone()))
            .collect();
        let evaluation = plan.evaluate(documents, &query.bind_vars)?;

        let batch_size = query.options.batch_size.unwrap_or(self.batch_size).max(1);
        let count = query.options.count.then_some(evaluation.items.len());
        let full_count = query.options.full_count.then_some(evaluation.full_count);

        let mut items: VecDeque<Value> = evaluation.items.into();
        let take = batch_size.min(items.len());
        let first: Vec<Value> = items.drain(..take).collect();

        let id = if items.is_empty() {
            None
        } else {
            let id = uuid::Uuid::new_v4().to_string();
            state
                .cursors
                .insert(id.clone(), PendingCursor { items, batch_size });
            Some(id)
        };

        Ok(CursorBatch {
            has_more: id.is_some(),
            id,
            items: first,
            count,
            full_count,
        })
    }

    fn next_batch(&self, cursor_id: &str) -> StoreResult<CursorBatch> {
        let mut state = self.state.write();
        let cursor = state.cursors.get_mut(cursor_id).ok_or_else(|| {
            StoreError::server(
                codes::CURSOR_NOT_FOUND,
                format!("cursor not found: {}", cursor_id),
            )
        })?;

        let take = cursor.batch_size.min(cursor.items.len());
        let items: Vec<Value> = cursor.items.drain(..take).collect();
        let has_more = !cursor.items.is_empty();
        if !has_more {
            state.cursors.remove(cursor_id);
        }

        Ok(CursorBatch {
            id: Some(cursor_id.to_string()),
            items,
            has_more,
            count: None,
            full_count: None,
        })
    }

    fn close_cursor(&self, cursor_id: &str) -> StoreResult<()> {
        match self.state.write().cursors.remove(cursor_id) {
            Some(_) => Ok(()),
            None => Err(StoreError::server(
                codes::CURSOR_NOT_FOUND,
                format!("cursor not found: {}", cursor_id),
            )),
        }
    }

    fn has_graph(&self, name: &str) -> StoreResult<bool> {
        Ok(self.state.read().graphs.contains_key(name))
    }

    fn create_graph(&self, definition: &GraphDefinition) -> StoreResult<()> {
        let mut state = self.state.write();
        if state.graphs.contains_key(&definition.name) {
            return Err(StoreError::server(
                codes::GRAPH_DUPLICATE,
                format!("graph already exists: {}", definition.name),
            ));
        }

        for edge in &definition.edge_definitions {
            state.ensure_collection(&edge.edge_collection, CollectionOptions::edge());
        }
        for name in definition.collections() {
            state.ensure_collection(&name, CollectionOptions::default());
        }
        state
            .graphs
            .insert(definition.name.clone(), definition.clone());
        Ok(())
    }

    fn delete_graph(
        &self,
        name: &str,
        ignore_missing: bool,
        drop_collections: bool,
    ) -> StoreResult<bool> {
        let mut state = self.state.write();
        let Some(definition) = state.graphs.remove(name) else {
            if ignore_missing {
                return Ok(false);
            }
            return Err(StoreError::graph_not_found(name));
        };

        if drop_collections {
            for collection in definition.collections() {
                let shared = state
                    .graphs
                    .values()
                    .any(|g| g.collections().contains(&collection));
                if !shared {
                    state.collections.remove(&collection);
                }
            }
        }
        Ok(true)
    }

    fn insert_vertex(
        &self,
        graph: &str,
        collection: &str,
        document: Document,
    ) -> StoreResult<DocumentHeader> {
        let mut state = self.state.write();
        state.check_vertex_collection(graph, collection)?;
        state.insert(collection, document)
    }

    fn insert_edge(
        &self,
        graph: &str,
        collection: &str,
        document: Document,
    ) -> StoreResult<DocumentHeader> {
        let mut state = self.state.write();
        state.check_edge_endpoints(graph, collection, &document)?;
        state.insert(collection, document)
    }

    fn replace_vertex(
        &self,
        graph: &str,
        collection: &str,
        document: Document,
    ) -> StoreResult<DocumentHeader> {
        let mut state = self.state.write();
        state.check_vertex_collection(graph, collection)?;
        state.replace(collection, document)
    }

    fn replace_edge(
        &self,
        graph: &str,
        collection: &str,
        document: Document,
    ) -> StoreResult<DocumentHeader> {
        let mut state = self.state.write();
        state.check_edge_endpoints(graph, collection, &document)?;
        state.replace(collection, document)
    }

    fn delete_vertex(
        &self,
        graph: &str,
        collection: &str,
        key: &str,
        rev: Option<&str>,
        ignore_missing: bool,
    ) -> StoreResult<bool> {
        let mut state = self.state.write();
        state.check_vertex_collection(graph, collection)?;
        let deleted = state.delete(collection, key, rev, ignore_missing)?;
        if deleted {
            state.remove_incident_edges(collection, &format!("{}/{}", collection, key));
        }
        Ok(deleted)
    }

    fn delete_edge(
        &self,
        graph: &str,
        collection: &str,
        key: &str,
        rev: Option<&str>,
        ignore_missing: bool,
    ) -> StoreResult<bool> {
        let mut state = self.state.write();
        if state.graph(graph)?.edge_definition(collection).is_none() {
            return Err(StoreError::server(
                codes::GRAPH_EDGE_COLLECTION_NOT_USED,
                format!("edge collection '{}' not used in graph '{}'", collection, graph),
            ));
        }
        state.delete(collection, key, rev, ignore_missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BindVars, EdgeDefinition, QueryOptions};
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("document must be an object"),
        }
    }

    fn store_with(collection: &str) -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .create_collection(collection, &CollectionOptions::default())
            .unwrap();
        store
    }

    fn scan(collection: &str) -> Query {
        let vars = doc(json!({"@collection": collection}));
        Query::new("FOR i IN @@collection\n    RETURN i", vars)
    }

    fn relation_graph() -> GraphDefinition {
        GraphDefinition {
            name: "relation_graph".into(),
            edge_definitions: vec![EdgeDefinition {
                edge_collection: "relations".into(),
                from_vertex_collections: vec!["persons".into()],
                to_vertex_collections: vec!["persons".into()],
            }],
            orphan_collections: vec![],
        }
    }

    #[test]
    fn insert_assigns_key_and_rev() {
        let store = store_with("people");
        let header = store.insert("people", doc(json!({"name": "a"}))).unwrap();

        assert!(!header.key.is_empty());
        assert!(!header.rev.is_empty());
        let stored = store.get("people", &header.key).unwrap().unwrap();
        assert_eq!(stored["_id"], json!(header.id));
        assert_eq!(stored["name"], json!("a"));
    }

    #[test]
    fn insert_duplicate_key_fails() {
        let store = store_with("people");
        store.insert("people", doc(json!({"_key": "k"}))).unwrap();
        let err = store.insert("people", doc(json!({"_key": "k"}))).unwrap_err();
        assert!(err.has_code(codes::UNIQUE_CONSTRAINT_VIOLATED));
    }

    #[test]
    fn missing_collection() {
        let store = InMemoryStore::new();
        let err = store.insert("nope", Document::new()).unwrap_err();
        assert!(err.has_code(codes::DATA_SOURCE_NOT_FOUND));
        assert!(!store.delete_collection("nope", true).unwrap());
        let err = store.truncate_collection("nope").unwrap_err();
        assert!(err.has_code(codes::DATA_SOURCE_NOT_FOUND));
    }

    #[test]
    fn unique_index_enforced() {
        let store = store_with("identities");
        store
            .ensure_index("identities", &IndexSpec::unique(["name"]))
            .unwrap();
        store.insert("identities", doc(json!({"name": "x"}))).unwrap();
        let err = store
            .insert("identities", doc(json!({"name": "x"})))
            .unwrap_err();
        assert!(err.has_code(codes::UNIQUE_CONSTRAINT_VIOLATED));
        store.insert("identities", doc(json!({"name": "y"}))).unwrap();
    }

    #[test]
    fn insert_many_reports_each_document() {
        let store = store_with("identities");
        store
            .ensure_index("identities", &IndexSpec::unique(["name"]))
            .unwrap();
        let results = store.insert_many(
            "identities",
            vec![
                doc(json!({"name": "x"})),
                doc(json!({"name": "x"})),
                doc(json!({"name": "y"})),
            ],
        );

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1]
            .as_ref()
            .is_err_and(|err| err.has_code(codes::UNIQUE_CONSTRAINT_VIOLATED)));
        assert!(results[2].is_ok());
        assert_eq!(store.count("identities").unwrap(), 2);
    }

    #[test]
    fn sparse_unique_index_skips_nulls() {
        let store = store_with("identities");
        store
            .ensure_index("identities", &IndexSpec::unique(["extra"]).sparse())
            .unwrap();
        store.insert("identities", doc(json!({"name": "a"}))).unwrap();
        store.insert("identities", doc(json!({"name": "b"}))).unwrap();
        assert_eq!(store.count("identities").unwrap(), 2);
    }

    #[test]
    fn replace_checks_revision() {
        let store = store_with("people");
        let first = store.insert("people", doc(json!({"name": "a"}))).unwrap();

        let updated = store
            .replace(
                "people",
                doc(json!({"_key": first.key, "_rev": first.rev, "name": "b"})),
            )
            .unwrap();
        assert_ne!(updated.rev, first.rev);

        let err = store
            .replace(
                "people",
                doc(json!({"_key": first.key, "_rev": first.rev, "name": "c"})),
            )
            .unwrap_err();
        assert!(err.has_code(codes::CONFLICT));
    }

    #[test]
    fn replace_missing_document() {
        let store = store_with("people");
        let err = store
            .replace("people", doc(json!({"_key": "gone"})))
            .unwrap_err();
        assert!(err.has_code(codes::DOCUMENT_NOT_FOUND));
    }

    #[test]
    fn delete_ignore_missing() {
        let store = store_with("people");
        let header = store.insert("people", Document::new()).unwrap();
        assert!(store.delete("people", &header.key, None, false).unwrap());
        assert!(!store.delete("people", &header.key, None, true).unwrap());
        let err = store.delete("people", &header.key, None, false).unwrap_err();
        assert!(err.has_code(codes::DOCUMENT_NOT_FOUND));
    }

    #[test]
    fn edge_collection_rejects_user_keys() {
        let store = InMemoryStore::new();
        store
            .create_collection("relations", &CollectionOptions::edge())
            .unwrap();
        let edge = doc(json!({"_key": "e", "_from": "p/1", "_to": "p/2"}));
        let err = store.insert("relations", edge).unwrap_err();
        assert!(err.has_code(codes::DOCUMENT_KEY_UNEXPECTED));

        let err = store.insert("relations", Document::new()).unwrap_err();
        assert!(err.has_code(codes::INVALID_EDGE_ATTRIBUTE));
    }

    #[test]
    fn cursor_batches() {
        let store = InMemoryStore::with_batch_size(2);
        store
            .create_collection("people", &CollectionOptions::default())
            .unwrap();
        for i in 0..5 {
            store.insert("people", doc(json!({"n": i}))).unwrap();
        }

        let query = scan("people").with_options(QueryOptions {
            count: true,
            ..QueryOptions::default()
        });
        let first = store.execute(&query).unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.count, Some(5));
        assert!(first.has_more);

        let id = first.id.unwrap();
        assert_eq!(store.open_cursors(), 1);
        assert_eq!(store.next_batch(&id).unwrap().items.len(), 2);
        let last = store.next_batch(&id).unwrap();
        assert_eq!(last.items.len(), 1);
        assert!(!last.has_more);

        assert_eq!(store.open_cursors(), 0);
        let err = store.close_cursor(&id).unwrap_err();
        assert!(err.has_code(codes::CURSOR_NOT_FOUND));
    }

    #[test]
    fn small_results_have_no_cursor() {
        let store = store_with("people");
        store.insert("people", Document::new()).unwrap();
        let batch = store.execute(&scan("people")).unwrap();
        assert!(batch.id.is_none());
        assert!(!batch.has_more);
        assert_eq!(batch.count, None);
    }

    #[test]
    fn query_without_collection_bind_var() {
        let store = store_with("people");
        let query = Query::new("FOR i IN @@collection\n RETURN i", BindVars::new());
        let err = store.execute(&query).unwrap_err();
        assert!(err.has_code(codes::QUERY_BIND_PARAMETER_MISSING));
    }

    #[test]
    fn graph_creates_collections() {
        let store = InMemoryStore::new();
        store.create_graph(&relation_graph()).unwrap();
        assert!(store.has_graph("relation_graph").unwrap());
        assert!(store.has_collection("persons").unwrap());
        assert!(store.has_collection("relations").unwrap());

        let err = store.create_graph(&relation_graph()).unwrap_err();
        assert!(err.has_code(codes::GRAPH_DUPLICATE));
    }

    #[test]
    fn graph_edge_requires_existing_endpoints() {
        let store = InMemoryStore::new();
        store.create_graph(&relation_graph()).unwrap();
        let a = store
            .insert_vertex("relation_graph", "persons", Document::new())
            .unwrap();

        let dangling = doc(json!({"_from": a.id, "_to": "persons/missing"}));
        let err = store
            .insert_edge("relation_graph", "relations", dangling)
            .unwrap_err();
        assert!(err.has_code(codes::DOCUMENT_NOT_FOUND));

        let foreign = doc(json!({"_from": a.id, "_to": "places/1"}));
        let err = store
            .insert_edge("relation_graph", "relations", foreign)
            .unwrap_err();
        assert!(err.has_code(codes::GRAPH_REFERENCED_VERTEX_COLLECTION_NOT_USED));
    }

    #[test]
    fn delete_vertex_removes_incident_edges() {
        let store = InMemoryStore::new();
        store.create_graph(&relation_graph()).unwrap();
        let a = store
            .insert_vertex("relation_graph", "persons", Document::new())
            .unwrap();
        let b = store
            .insert_vertex("relation_graph", "persons", Document::new())
            .unwrap();
        let edge = doc(json!({"_from": a.id, "_to": b.id}));
        store.insert_edge("relation_graph", "relations", edge).unwrap();

        assert!(store
            .delete_vertex("relation_graph", "persons", &a.key, None, false)
            .unwrap());
        assert_eq!(store.count("relations").unwrap(), 0);
        assert_eq!(store.count("persons").unwrap(), 1);
    }

    #[test]
    fn plain_delete_keeps_edges() {
        let store = InMemoryStore::new();
        store.create_graph(&relation_graph()).unwrap();
        let a = store
            .insert_vertex("relation_graph", "persons", Document::new())
            .unwrap();
        let edge = doc(json!({"_from": a.id, "_to": a.id}));
        store.insert_edge("relation_graph", "relations", edge).unwrap();

        store.delete("persons", &a.key, None, false).unwrap();
        assert_eq!(store.count("relations").unwrap(), 1);
    }

    #[test]
    fn delete_graph_drops_collections() {
        let store = InMemoryStore::new();
        store.create_graph(&relation_graph()).unwrap();
        assert!(store.delete_graph("relation_graph", false, true).unwrap());
        assert!(!store.has_collection("persons").unwrap());

        assert!(!store.delete_graph("relation_graph", true, false).unwrap());
        let err = store
            .delete_graph("relation_graph", false, false)
            .unwrap_err();
        assert!(err.has_code(codes::GRAPH_NOT_FOUND));
    }
}

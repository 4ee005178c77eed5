//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Numeric error codes reported by the document store.
///
/// The numbering follows ArangoDB's `errorNum` values so that a network
/// backend can pass server errors through unchanged.
pub mod codes {
    /// Write-write conflict, usually a stale `_rev`.
    pub const CONFLICT: i64 = 1200;
    /// The addressed document does not exist.
    pub const DOCUMENT_NOT_FOUND: i64 = 1202;
    /// The addressed collection or view does not exist.
    pub const DATA_SOURCE_NOT_FOUND: i64 = 1203;
    /// The document handle (`_key` / `_id`) is malformed or missing.
    pub const DOCUMENT_HANDLE_BAD: i64 = 1205;
    /// A collection with this name already exists.
    pub const DUPLICATE_NAME: i64 = 1207;
    /// A unique index (or the primary key) would be violated.
    pub const UNIQUE_CONSTRAINT_VIOLATED: i64 = 1210;
    /// The collection does not accept user supplied keys.
    pub const DOCUMENT_KEY_UNEXPECTED: i64 = 1222;
    /// An edge document is missing a valid `_from` or `_to` attribute.
    pub const INVALID_EDGE_ATTRIBUTE: i64 = 1233;
    /// The query text could not be parsed.
    pub const QUERY_PARSE: i64 = 1501;
    /// A bind parameter referenced by the query was not supplied.
    pub const QUERY_BIND_PARAMETER_MISSING: i64 = 1551;
    /// The addressed server-side cursor does not exist (anymore).
    pub const CURSOR_NOT_FOUND: i64 = 1600;
    /// The addressed graph does not exist.
    pub const GRAPH_NOT_FOUND: i64 = 1924;
    /// A graph with this name already exists.
    pub const GRAPH_DUPLICATE: i64 = 1925;
    /// The vertex collection is not part of the graph.
    pub const GRAPH_VERTEX_COLLECTION_NOT_USED: i64 = 1926;
    /// The edge collection is not part of the graph.
    pub const GRAPH_EDGE_COLLECTION_NOT_USED: i64 = 1930;
    /// An edge references a vertex collection its definition does not allow.
    pub const GRAPH_REFERENCED_VERTEX_COLLECTION_NOT_USED: i64 = 1947;
}

/// Errors that can occur during store operations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store rejected the request with a numeric error code.
    #[error("store error {code}: {message}")]
    Server {
        /// The store's error number (see [`codes`]).
        code: i64,
        /// The store's error message.
        message: String,
    },

    /// The store could not be reached.
    #[error("transport error: {0}")]
    Transport(String),
}

impl StoreError {
    /// Creates a server error with the given code.
    pub fn server(code: i64, message: impl Into<String>) -> Self {
        Self::Server {
            code,
            message: message.into(),
        }
    }

    /// Returns the store's error number, if the store produced one.
    pub fn code(&self) -> Option<i64> {
        match self {
            StoreError::Server { code, .. } => Some(*code),
            StoreError::Transport(_) => None,
        }
    }

    /// Returns true if this error carries the given error number.
    pub fn has_code(&self, code: i64) -> bool {
        self.code() == Some(code)
    }

    /// Returns the error message without the code prefix.
    pub fn message(&self) -> &str {
        match self {
            StoreError::Server { message, .. } => message,
            StoreError::Transport(message) => message,
        }
    }

    pub(crate) fn document_not_found(collection: &str, key: &str) -> Self {
        Self::server(
            codes::DOCUMENT_NOT_FOUND,
            format!("document not found: {}/{}", collection, key),
        )
    }

    pub(crate) fn collection_not_found(name: &str) -> Self {
        Self::server(
            codes::DATA_SOURCE_NOT_FOUND,
            format!("collection or view not found: {}", name),
        )
    }

    pub(crate) fn graph_not_found(name: &str) -> Self {
        Self::server(codes::GRAPH_NOT_FOUND, format!("graph '{}' not found", name))
    }

    pub(crate) fn query_parse(message: impl Into<String>) -> Self {
        Self::server(codes::QUERY_PARSE, message)
    }
}

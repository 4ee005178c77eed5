//! Error types for docgraph core.

use docgraph_store::{codes, StoreError};
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in docgraph core operations.
///
/// Store failures with a recognized error code are classified into the
/// typed variants below; every other store failure is carried unchanged in
/// [`CoreError::Store`].
#[derive(Debug, Error)]
pub enum CoreError {
    /// The requested record does not exist.
    #[error("model not found: {message}")]
    ModelNotFound {
        /// Description of what was looked up.
        message: String,
    },

    /// A single match was required but several records matched.
    #[error("multiple models found: {message}")]
    MultipleModelsFound {
        /// Description of the query.
        message: String,
    },

    /// The store reported a unique index violation.
    #[error("unique constraint violated: {message}")]
    UniqueConstraint {
        /// The store's explanation.
        message: String,
    },

    /// A collection required by the operation does not exist.
    #[error("data source not found: {name}")]
    DataSourceNotFound {
        /// Name of the collection.
        name: String,
    },

    /// A graph required by the operation does not exist.
    #[error("graph not found: {name}")]
    GraphNotFound {
        /// Name of the graph.
        name: String,
    },

    /// The server-side cursor is gone.
    #[error("cursor not found: {message}")]
    CursorNotFound {
        /// The store's explanation.
        message: String,
    },

    /// The cursor was used in a way its query did not allow.
    #[error("cursor error: {message}")]
    Cursor {
        /// Description of the violated precondition.
        message: String,
    },

    /// A filter used an operator symbol outside the supported table.
    #[error("unsupported operator '{operator}' on field '{field}'")]
    UnsupportedOperator {
        /// The filtered field path.
        field: String,
        /// The rejected operator symbol.
        operator: String,
    },

    /// A sort term used a direction other than `ASC` or `DESC`.
    #[error("invalid sort direction '{direction}' for field '{field}'")]
    InvalidSortDirection {
        /// The sorted field path.
        field: String,
        /// The rejected direction token.
        direction: String,
    },

    /// A named lock could not be acquired.
    #[error("lock '{name}' is held elsewhere")]
    LockUnavailable {
        /// The lock name.
        name: String,
    },

    /// Required configuration is missing.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the missing configuration.
        message: String,
    },

    /// The query options are inconsistent.
    #[error("invalid query: {message}")]
    InvalidQuery {
        /// Description of the problem.
        message: String,
    },

    /// A record could not be turned into a store document.
    #[error("invalid record: {message}")]
    InvalidRecord {
        /// Description of the problem.
        message: String,
    },

    /// Unclassified store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Creates a model not found error.
    pub fn model_not_found(message: impl Into<String>) -> Self {
        Self::ModelNotFound {
            message: message.into(),
        }
    }

    /// Creates a multiple models found error.
    pub fn multiple_models_found(message: impl Into<String>) -> Self {
        Self::MultipleModelsFound {
            message: message.into(),
        }
    }

    /// Creates a cursor error.
    pub fn cursor(message: impl Into<String>) -> Self {
        Self::Cursor {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid query error.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Creates an invalid record error.
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Returns the store error code, if this is an unclassified store error.
    pub fn store_code(&self) -> Option<i64> {
        match self {
            CoreError::Store(err) => err.code(),
            _ => None,
        }
    }
}

/// The kind of store call a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    /// Collection insert or replace.
    Save,
    /// Graph-scoped insert or replace.
    GraphSave,
    /// Document, vertex or edge delete.
    Delete,
    /// Collection-level call (count, drop, truncate).
    Collection,
    /// Graph drop.
    DropGraph,
    /// Cursor batch fetch or release.
    Cursor,
}

/// Classifies a store failure.
///
/// `subject` names what the operation addressed (a record type, a
/// collection, a graph or a cursor) and is used in the error message.
pub(crate) fn translate(error: StoreError, operation: Operation, subject: &str) -> CoreError {
    let code = match error.code() {
        Some(code) => code,
        None => return CoreError::Store(error),
    };

    match (operation, code) {
        (Operation::Save | Operation::GraphSave, codes::UNIQUE_CONSTRAINT_VIOLATED) => {
            CoreError::UniqueConstraint {
                message: format!("for '{}': {}", subject, error.message()),
            }
        }
        (Operation::GraphSave, codes::DOCUMENT_NOT_FOUND) => {
            CoreError::model_not_found(format!("'{}': {}", subject, error.message()))
        }
        (Operation::Delete, codes::DOCUMENT_NOT_FOUND) => {
            CoreError::model_not_found(format!("'{}': {}", subject, error.message()))
        }
        (Operation::Collection, codes::DATA_SOURCE_NOT_FOUND) => CoreError::DataSourceNotFound {
            name: subject.to_string(),
        },
        (Operation::DropGraph, codes::GRAPH_NOT_FOUND) => CoreError::GraphNotFound {
            name: subject.to_string(),
        },
        (Operation::Cursor, codes::CURSOR_NOT_FOUND) => CoreError::CursorNotFound {
            message: error.message().to_string(),
        },
        _ => CoreError::Store(error),
    }
}

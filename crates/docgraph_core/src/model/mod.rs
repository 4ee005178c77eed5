//! Record model.
//!
//! A record is a user struct implementing [`Model`]. It embeds a
//! [`DocumentMeta`] carrying the store's `_key` and `_rev`; edge records
//! additionally embed an [`EdgeMeta`] carrying `_from` and `_to`.
//!
//! # Example
//!
//! ```rust
//! use docgraph_core::{DocumentMeta, Model};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct Identity {
//!     #[serde(flatten)]
//!     meta: DocumentMeta,
//!     name: String,
//! }
//!
//! impl Model for Identity {
//!     fn meta(&self) -> &DocumentMeta {
//!         &self.meta
//!     }
//!     fn meta_mut(&mut self) -> &mut DocumentMeta {
//!         &mut self.meta
//!     }
//! }
//!
//! let alice = Identity { name: "Alice".into(), ..Default::default() };
//! assert!(!alice.is_persisted());
//! ```

mod edge;

pub use edge::{EdgeMeta, Endpoint, LinkedVertex};

use crate::error::CoreResult;
use crate::names::short_type_name;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// The store-managed identity of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// The primary key, unset until assigned.
    #[serde(rename = "_key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// The revision of the last successful write; empty until persisted.
    #[serde(rename = "_rev", default)]
    pub rev: String,
}

impl DocumentMeta {
    /// Creates metadata for a new record with a caller-chosen key.
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            rev: String::new(),
        }
    }
}

/// Optional creation and update times in milliseconds since the Unix epoch.
///
/// Flatten into a record and call [`Timestamps::touch`] from
/// [`Model::before_save`] to maintain them. Unset times are not stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    /// When the record was first saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_created: Option<u64>,
    /// When the record was last saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_updated: Option<u64>,
}

impl Timestamps {
    /// Stamps a save: sets `time_created` if unset and `time_updated` always.
    pub fn touch(&mut self) {
        let now = now_millis();
        self.time_created.get_or_insert(now);
        self.time_updated = Some(now);
    }
}

/// Returns the current time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Whether a record is a vertex or an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// A plain document.
    Vertex,
    /// An edge document with `_from` and `_to`.
    Edge,
}

/// Caller-supplied values passed to [`Model::before_save`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveContext {
    values: Map<String, Value>,
}

impl SaveContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Returns a value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns a string value.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }
}

/// A record type stored in its own collection.
///
/// Implementors embed a [`DocumentMeta`] with `#[serde(flatten)]` and expose
/// it through [`meta`](Model::meta) / [`meta_mut`](Model::meta_mut). Edge
/// types set [`KIND`](Model::KIND) to [`RecordKind::Edge`] and return their
/// [`EdgeMeta`] from [`edge`](Model::edge).
pub trait Model: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Vertex or edge.
    const KIND: RecordKind = RecordKind::Vertex;

    /// Returns the record's store metadata.
    fn meta(&self) -> &DocumentMeta;

    /// Returns the record's store metadata for updating.
    fn meta_mut(&mut self) -> &mut DocumentMeta;

    /// Overrides the collection name (before prefixing).
    fn collection_name() -> Option<&'static str> {
        None
    }

    /// The name the collection namer is applied to.
    fn type_name() -> &'static str {
        short_type_name::<Self>()
    }

    /// Returns the endpoints of an edge record.
    fn edge(&self) -> Option<&EdgeMeta> {
        None
    }

    /// Runs before every save, with `new` set for inserts.
    ///
    /// May change the record's fields; must not write to the store.
    fn before_save(&mut self, _new: bool, _ctx: &SaveContext) -> CoreResult<()> {
        Ok(())
    }

    /// Returns the key, if assigned.
    fn key(&self) -> Option<&str> {
        self.meta().key.as_deref()
    }

    /// Returns the revision; empty until persisted.
    fn rev(&self) -> &str {
        &self.meta().rev
    }

    /// Returns true once the record has been written to the store.
    fn is_persisted(&self) -> bool {
        !self.meta().rev.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Identity {
        #[serde(flatten)]
        meta: DocumentMeta,
        name: String,
    }

    impl Model for Identity {
        fn meta(&self) -> &DocumentMeta {
            &self.meta
        }
        fn meta_mut(&mut self) -> &mut DocumentMeta {
            &mut self.meta
        }
    }

    #[test]
    fn transient_record_serialization() {
        let record = Identity {
            name: "Alice".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"_rev": "", "name": "Alice"}));
        assert!(!record.is_persisted());
        assert_eq!(record.key(), None);
    }

    #[test]
    fn timestamps_are_epoch_millis() {
        let mut times = Timestamps::default();
        assert_eq!(serde_json::to_value(times).unwrap(), json!({}));

        let before = now_millis();
        times.touch();
        let created = times.time_created.unwrap();
        assert!(created >= before);
        assert_eq!(times.time_updated, Some(created));

        times.time_updated = Some(0);
        times.touch();
        assert_eq!(times.time_created, Some(created));
        assert!(times.time_updated.unwrap() >= created);

        let value = serde_json::to_value(times).unwrap();
        assert_eq!(value["time_created"], json!(created));
        let back: Timestamps = serde_json::from_value(value).unwrap();
        assert_eq!(back, times);
    }

    #[test]
    fn stored_document_deserializes() {
        let doc = json!({"_key": "1", "_id": "identities/1", "_rev": "_r1", "name": "Bob"});
        let record: Identity = serde_json::from_value(doc).unwrap();
        assert_eq!(record.key(), Some("1"));
        assert_eq!(record.rev(), "_r1");
        assert!(record.is_persisted());
        assert_eq!(Identity::KIND, RecordKind::Vertex);
    }

    #[test]
    fn save_context_values() {
        let ctx = SaveContext::new().with("override_extra", "xyz");
        assert_eq!(ctx.get_str("override_extra"), Some("xyz"));
        assert!(ctx.get("missing").is_none());
    }
}

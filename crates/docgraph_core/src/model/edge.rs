//! Edge endpoints.

use super::Model;
use crate::names::{collection_of, CollectionRef, NameRegistry};
use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::Arc;

/// A vertex shared between an edge and its other owners.
///
/// The endpoint is resolved when the edge is written, so a key assigned to
/// the vertex after the edge was built is still picked up.
pub trait LinkedVertex: Send + Sync {
    /// Returns the vertex identifier, `None` while it has no key.
    fn identifier(&self, names: &NameRegistry) -> Option<String>;

    /// Returns the vertex key, if assigned.
    fn key(&self) -> Option<String>;
}

impl<V: Model> LinkedVertex for RwLock<V> {
    fn identifier(&self, names: &NameRegistry) -> Option<String> {
        let key = self.read().key()?.to_string();
        Some(format!("{}/{}", names.collection::<V>(), key))
    }

    fn key(&self) -> Option<String> {
        self.read().key().map(str::to_string)
    }
}

/// One end of an edge.
#[derive(Clone)]
pub enum Endpoint {
    /// A `collection/key` identifier.
    Id(String),
    /// A vertex captured when the endpoint was built.
    Record {
        /// Resolves the vertex collection.
        collection: CollectionRef,
        /// The vertex key at capture time.
        key: Option<String>,
    },
    /// A vertex read when the endpoint is resolved.
    Shared(Arc<dyn LinkedVertex>),
}

impl Endpoint {
    /// Creates an endpoint from an identifier.
    pub fn id(id: impl Into<String>) -> Self {
        Endpoint::Id(id.into())
    }

    /// Creates an endpoint from the current key of `vertex`.
    pub fn to<V: Model>(vertex: &V) -> Self {
        Endpoint::Record {
            collection: collection_of::<V>,
            key: vertex.key().map(str::to_string),
        }
    }

    /// Creates an endpoint reading `vertex` at resolution time.
    pub fn shared<V: Model>(vertex: &Arc<RwLock<V>>) -> Self {
        let vertex: Arc<dyn LinkedVertex> = vertex.clone();
        Endpoint::Shared(vertex)
    }

    /// Resolves the endpoint to an identifier.
    ///
    /// Returns `None` for a vertex without a key.
    pub fn resolve(&self, names: &NameRegistry) -> Option<String> {
        match self {
            Endpoint::Id(id) => Some(id.clone()),
            Endpoint::Record { collection, key } => key
                .as_ref()
                .map(|key| format!("{}/{}", collection(names), key)),
            Endpoint::Shared(vertex) => vertex.identifier(names),
        }
    }

    /// Returns the key part of the endpoint, if known.
    pub fn key(&self) -> Option<String> {
        match self {
            Endpoint::Id(id) => id.split_once('/').map(|(_, key)| key.to_string()),
            Endpoint::Record { key, .. } => key.clone(),
            Endpoint::Shared(vertex) => vertex.key(),
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Id(id) => f.debug_tuple("Id").field(id).finish(),
            Endpoint::Record { key, .. } => f.debug_struct("Record").field("key", key).finish(),
            Endpoint::Shared(vertex) => f.debug_tuple("Shared").field(&vertex.key()).finish(),
        }
    }
}

impl From<&str> for Endpoint {
    fn from(id: &str) -> Self {
        Endpoint::id(id)
    }
}

impl From<String> for Endpoint {
    fn from(id: String) -> Self {
        Endpoint::Id(id)
    }
}

impl<'de> Deserialize<'de> for Endpoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Endpoint::Id)
    }
}

/// The endpoints of an edge record.
///
/// Embed with `#[serde(flatten)]`. Endpoints are read back from `_from` and
/// `_to` as identifiers and written by the collection after resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeMeta {
    /// The source vertex.
    #[serde(rename = "_from", skip_serializing)]
    pub from: Endpoint,

    /// The target vertex.
    #[serde(rename = "_to", skip_serializing)]
    pub to: Endpoint,
}

impl EdgeMeta {
    /// Creates edge endpoints.
    pub fn new(from: impl Into<Endpoint>, to: impl Into<Endpoint>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentMeta;
    use serde_json::json;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Person {
        #[serde(flatten)]
        meta: DocumentMeta,
        name: String,
    }

    impl Model for Person {
        fn meta(&self) -> &DocumentMeta {
            &self.meta
        }
        fn meta_mut(&mut self) -> &mut DocumentMeta {
            &mut self.meta
        }
    }

    #[test]
    fn snapshot_endpoint() {
        let names = NameRegistry::default();
        let mut person = Person::default();
        assert_eq!(Endpoint::to(&person).resolve(&names), None);

        person.meta.key = Some("alice".into());
        let endpoint = Endpoint::to(&person);
        assert_eq!(endpoint.resolve(&names).as_deref(), Some("people/alice"));
        assert_eq!(endpoint.key().as_deref(), Some("alice"));
    }

    #[test]
    fn shared_endpoint_sees_later_key() {
        let names = NameRegistry::new("t_", crate::names::pluralize_underscore, crate::names::underscore);
        let person = Arc::new(RwLock::new(Person::default()));
        let endpoint = Endpoint::shared(&person);
        assert_eq!(endpoint.resolve(&names), None);

        person.write().meta.key = Some("bob".into());
        assert_eq!(endpoint.resolve(&names).as_deref(), Some("t_people/bob"));
    }

    #[test]
    fn identifier_endpoint() {
        let endpoint = Endpoint::from("people/1");
        assert_eq!(endpoint.key().as_deref(), Some("1"));
        assert_eq!(
            endpoint.resolve(&NameRegistry::default()).as_deref(),
            Some("people/1")
        );
    }

    #[test]
    fn edge_meta_reads_identifiers_but_never_writes() {
        let edge: EdgeMeta =
            serde_json::from_value(json!({"_from": "people/1", "_to": "people/2"})).unwrap();
        assert_eq!(edge.from.key().as_deref(), Some("1"));
        assert_eq!(edge.to.key().as_deref(), Some("2"));
        assert_eq!(serde_json::to_value(&edge).unwrap(), json!({}));
    }
}

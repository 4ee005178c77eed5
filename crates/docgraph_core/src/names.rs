//! Collection and graph name resolution.

use crate::graph::Graph;
use crate::model::Model;
use heck::ToSnakeCase;
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

/// A function deriving a store-side name from a type's short name.
pub type Namer = fn(&str) -> String;

/// A function resolving the collection name of a record type.
///
/// Edge definitions and record references carry these instead of names
/// so that resolution honors the database's prefix and namers.
pub type CollectionRef = fn(&NameRegistry) -> String;

/// Returns the [`CollectionRef`] of record type `T`.
pub fn collection_of<T: Model>(names: &NameRegistry) -> String {
    names.collection::<T>()
}

/// Converts a type name to `snake_case`.
///
/// This is the default graph namer: `RelationGraph` becomes `relation_graph`.
pub fn underscore(name: &str) -> String {
    name.to_snake_case()
}

/// Converts a type name to a pluralized `snake_case` name.
///
/// This is the default collection namer: `Identity` becomes `identities`,
/// `Person` becomes `people`.
pub fn pluralize_underscore(name: &str) -> String {
    let snake = name.to_snake_case();
    let (head, last) = match snake.rsplit_once('_') {
        Some((head, last)) => (Some(head), last),
        None => (None, snake.as_str()),
    };
    let plural = pluralize(last);
    match head {
        Some(head) => format!("{}_{}", head, plural),
        None => plural,
    }
}

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("mouse", "mice"),
    ("foot", "feet"),
    ("tooth", "teeth"),
];

const UNCOUNTABLE: &[&str] = &["data", "information", "equipment", "series", "species", "news"];

fn pluralize(word: &str) -> String {
    if word.is_empty() || UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == word) {
        return (*plural).to_string();
    }

    let ends_with_consonant_y = word.ends_with('y')
        && !word[..word.len() - 1].ends_with(['a', 'e', 'i', 'o', 'u']);

    if ends_with_consonant_y {
        format!("{}ies", &word[..word.len() - 1])
    } else if word.ends_with(['s', 'x', 'z']) || word.ends_with("ch") || word.ends_with("sh") {
        format!("{}es", word)
    } else {
        format!("{}s", word)
    }
}

/// Returns the unqualified name of a type, without module path or generics.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Resolves and memoizes collection and graph names.
///
/// Each record or graph type is resolved once: an explicit override wins,
/// otherwise the configured namer is applied to the type's short name. The
/// global prefix is prepended in both cases.
pub struct NameRegistry {
    prefix: String,
    collection_namer: Namer,
    graph_namer: Namer,
    collections: RwLock<HashMap<TypeId, String>>,
    graphs: RwLock<HashMap<TypeId, String>>,
}

impl NameRegistry {
    /// Creates a registry with the given prefix and namers.
    pub fn new(prefix: impl Into<String>, collection_namer: Namer, graph_namer: Namer) -> Self {
        Self {
            prefix: prefix.into(),
            collection_namer,
            graph_namer,
            collections: RwLock::new(HashMap::new()),
            graphs: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the global name prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the collection name of record type `T`.
    pub fn collection<T: Model>(&self) -> String {
        Self::memoized(&self.collections, TypeId::of::<T>(), || {
            let base = match T::collection_name() {
                Some(name) => name.to_string(),
                None => (self.collection_namer)(T::type_name()),
            };
            format!("{}{}", self.prefix, base)
        })
    }

    /// Returns the graph name of graph type `G`.
    pub fn graph<G: Graph>(&self) -> String {
        Self::memoized(&self.graphs, TypeId::of::<G>(), || {
            let base = match G::graph_name() {
                Some(name) => name.to_string(),
                None => (self.graph_namer)(G::type_name()),
            };
            format!("{}{}", self.prefix, base)
        })
    }

    fn memoized(
        cache: &RwLock<HashMap<TypeId, String>>,
        id: TypeId,
        resolve: impl FnOnce() -> String,
    ) -> String {
        if let Some(name) = cache.read().get(&id) {
            return name.clone();
        }
        let name = resolve();
        cache.write().entry(id).or_insert(name).clone()
    }
}

impl Default for NameRegistry {
    fn default() -> Self {
        Self::new("", pluralize_underscore, underscore)
    }
}

impl fmt::Debug for NameRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameRegistry")
            .field("prefix", &self.prefix)
            .field("collections", &self.collections.read().len())
            .field("graphs", &self.graphs.read().len())
            .finish()
    }
}

//! Named graphs.
//!
//! A graph type declares its edge definitions and orphan collections by
//! record type; names are resolved through the database's name registry.
//!
//! ```rust,ignore
//! struct RelationGraph;
//!
//! impl Graph for RelationGraph {
//!     fn edge_definitions() -> Vec<EdgeSpec> {
//!         vec![EdgeSpec::new::<Relation>().from::<Person>().to::<Person>()]
//!     }
//! }
//!
//! let graph = db.graph::<RelationGraph>();
//! graph.ensure()?;
//! graph.save(&mut alice, &SaveContext::new())?;
//! graph.delete(&alice, false)?; // removes alice's relations as well
//! ```

use crate::collection::{persist, SaveTarget};
use crate::database::Database;
use crate::error::{translate, CoreError, CoreResult, Operation};
use crate::model::{Model, RecordKind, SaveContext};
use crate::names::{collection_of, short_type_name, CollectionRef, NameRegistry};
use docgraph_store::{codes, EdgeDefinition, GraphDefinition};
use std::fmt;
use std::marker::PhantomData;
use tracing::debug;

/// A named graph declaration.
///
/// Every method has a default, so a graph without edges is simply
/// `impl Graph for MyGraph {}`.
pub trait Graph: 'static {
    /// Overrides the graph name (before prefixing).
    fn graph_name() -> Option<&'static str> {
        None
    }

    /// The name the graph namer is applied to.
    fn type_name() -> &'static str {
        short_type_name::<Self>()
    }

    /// The graph's edge definitions.
    fn edge_definitions() -> Vec<EdgeSpec> {
        Vec::new()
    }

    /// Vertex collections not used by any edge definition.
    fn orphan_collections() -> Vec<CollectionRef> {
        Vec::new()
    }
}

/// Returns the collection reference of an orphan vertex type.
pub fn orphan<V: Model>() -> CollectionRef {
    collection_of::<V>
}

/// An edge definition by record type.
#[derive(Clone)]
pub struct EdgeSpec {
    edge: CollectionRef,
    from: Vec<CollectionRef>,
    to: Vec<CollectionRef>,
}

impl EdgeSpec {
    /// Starts a definition for edge type `E`.
    pub fn new<E: Model>() -> Self {
        Self {
            edge: collection_of::<E>,
            from: Vec::new(),
            to: Vec::new(),
        }
    }

    /// Allows vertices of type `V` as edge sources.
    #[must_use]
    pub fn from<V: Model>(mut self) -> Self {
        self.from.push(collection_of::<V>);
        self
    }

    /// Allows vertices of type `V` as edge targets.
    #[must_use]
    pub fn to<V: Model>(mut self) -> Self {
        self.to.push(collection_of::<V>);
        self
    }

    /// Resolves collection names.
    pub fn resolve(&self, names: &NameRegistry) -> EdgeDefinition {
        EdgeDefinition {
            edge_collection: (self.edge)(names),
            from_vertex_collections: self.from.iter().map(|c| c(names)).collect(),
            to_vertex_collections: self.to.iter().map(|c| c(names)).collect(),
        }
    }
}

/// A handle on graph type `G` in a database.
pub struct GraphHandle<'db, G: Graph> {
    db: &'db Database,
    name: String,
    _marker: PhantomData<fn() -> G>,
}

impl<'db, G: Graph> GraphHandle<'db, G> {
    pub(crate) fn new(db: &'db Database) -> Self {
        Self {
            db,
            name: db.names().graph::<G>(),
            _marker: PhantomData,
        }
    }

    /// Returns the graph name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the graph definition with resolved collection names.
    pub fn definition(&self) -> GraphDefinition {
        let names = self.db.names();
        GraphDefinition {
            name: self.name.clone(),
            edge_definitions: G::edge_definitions()
                .iter()
                .map(|spec| spec.resolve(names))
                .collect(),
            orphan_collections: G::orphan_collections().iter().map(|c| c(names)).collect(),
        }
    }

    /// Returns true if the graph exists.
    pub fn exists(&self) -> CoreResult<bool> {
        Ok(self.db.store().has_graph(&self.name)?)
    }

    /// Creates the graph and its missing collections unless it exists.
    pub fn ensure(&self) -> CoreResult<()> {
        let store = self.db.store();
        if store.has_graph(&self.name)? {
            return Ok(());
        }
        match store.create_graph(&self.definition()) {
            Ok(()) => {
                debug!(graph = %self.name, "created graph");
                Ok(())
            }
            Err(err) if err.has_code(codes::GRAPH_DUPLICATE) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Drops the graph.
    ///
    /// With `drop_collections` set, collections no other graph uses are
    /// dropped too. Returns false if the graph did not exist and
    /// `ignore_missing` is set.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::GraphNotFound`] if the graph does not exist
    /// and `ignore_missing` is not set.
    pub fn drop_graph(&self, ignore_missing: bool, drop_collections: bool) -> CoreResult<bool> {
        let dropped = self
            .db
            .store()
            .delete_graph(&self.name, ignore_missing, drop_collections)
            .map_err(|err| translate(err, Operation::DropGraph, &self.name))?;
        debug!(graph = %self.name, dropped, drop_collections, "dropped graph");
        Ok(dropped)
    }

    /// Saves a vertex or edge through the graph.
    ///
    /// Behaves like [`Collection::save`](crate::Collection::save), with the
    /// store additionally checking edge endpoints against the graph.
    ///
    /// # Errors
    ///
    /// - [`CoreError::UniqueConstraint`] on a unique index violation
    /// - [`CoreError::ModelNotFound`] if an edge endpoint does not exist
    pub fn save<T: Model>(&self, record: &mut T, ctx: &SaveContext) -> CoreResult<()> {
        let collection = self.db.names().collection::<T>();
        persist(self.db, &collection, record, ctx, SaveTarget::Graph(&self.name))
    }

    /// Deletes a vertex or edge through the graph.
    ///
    /// Deleting a vertex also deletes every edge incident to it.
    pub fn delete<T: Model>(&self, record: &T, ignore_missing: bool) -> CoreResult<bool> {
        match T::KIND {
            RecordKind::Vertex => self.delete_vertex(record, ignore_missing),
            RecordKind::Edge => self.delete_edge(record, ignore_missing),
        }
    }

    /// Deletes a vertex and its incident edges.
    pub fn delete_vertex<T: Model>(&self, record: &T, ignore_missing: bool) -> CoreResult<bool> {
        self.remove(record, ignore_missing, RecordKind::Vertex)
    }

    /// Deletes an edge.
    pub fn delete_edge<T: Model>(&self, record: &T, ignore_missing: bool) -> CoreResult<bool> {
        self.remove(record, ignore_missing, RecordKind::Edge)
    }

    fn remove<T: Model>(&self, record: &T, ignore_missing: bool, kind: RecordKind) -> CoreResult<bool> {
        let collection = self.db.names().collection::<T>();
        let Some(key) = record.key() else {
            if ignore_missing {
                return Ok(false);
            }
            return Err(CoreError::model_not_found(format!(
                "can't delete '{}' without a key",
                T::type_name()
            )));
        };
        let rev = Some(record.rev()).filter(|rev| !rev.is_empty());

        let store = self.db.store();
        let deleted = match kind {
            RecordKind::Vertex => {
                store.delete_vertex(&self.name, &collection, key, rev, ignore_missing)
            }
            RecordKind::Edge => store.delete_edge(&self.name, &collection, key, rev, ignore_missing),
        }
        .map_err(|err| {
            translate(
                err,
                Operation::Delete,
                &format!("{} '{}'", T::type_name(), key),
            )
        })?;
        debug!(graph = %self.name, collection = %collection, key, ?kind, deleted, "deleted through graph");
        Ok(deleted)
    }
}

impl<G: Graph> fmt::Debug for GraphHandle<'_, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphHandle")
            .field("name", &self.name)
            .finish()
    }
}

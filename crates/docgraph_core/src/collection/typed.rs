//! Typed collection implementation.

use crate::collection::codec::{apply_header, from_document, to_document};
use crate::cursor::Cursor;
use crate::database::Database;
use crate::error::{translate, CoreError, CoreResult, Operation};
use crate::lock::{LockGuard, Locked, NamedLock};
use crate::model::{Model, RecordKind, SaveContext};
use crate::query::{build_find_query, Filters, FindOptions, Sort};
use docgraph_store::{codes, CollectionOptions, IndexSpec};
use std::fmt;
use std::marker::PhantomData;
use tracing::debug;

/// Where a record is written.
#[derive(Debug, Clone, Copy)]
pub(crate) enum SaveTarget<'a> {
    /// Straight into the record's collection.
    Collection,
    /// Through the named graph, which validates edge endpoints.
    Graph(&'a str),
}

/// Writes `record` to `collection`, inserting it if it has never been
/// persisted and replacing it otherwise.
///
/// On success the record carries the key and revision the store reported.
pub(crate) fn persist<T: Model>(
    db: &Database,
    collection: &str,
    record: &mut T,
    ctx: &SaveContext,
    target: SaveTarget<'_>,
) -> CoreResult<()> {
    let new = !record.is_persisted();
    if new && T::KIND == RecordKind::Vertex && record.key().is_none() {
        if let Some(generate) = &db.config().key_generator {
            record.meta_mut().key = Some(generate());
        }
    }

    record.before_save(new, ctx)?;
    let document = to_document(record, collection, db.names())?;

    let store = db.store();
    let (operation, written) = match target {
        SaveTarget::Collection if new => (Operation::Save, store.insert(collection, document)),
        SaveTarget::Collection => (Operation::Save, store.replace(collection, document)),
        SaveTarget::Graph(graph) => {
            let written = match (T::KIND, new) {
                (RecordKind::Vertex, true) => store.insert_vertex(graph, collection, document),
                (RecordKind::Vertex, false) => store.replace_vertex(graph, collection, document),
                (RecordKind::Edge, true) => store.insert_edge(graph, collection, document),
                (RecordKind::Edge, false) => store.replace_edge(graph, collection, document),
            };
            (Operation::GraphSave, written)
        }
    };

    let header = written.map_err(|err| translate(err, operation, T::type_name()))?;
    debug!(collection, key = %header.key, rev = %header.rev, new, "saved record");
    apply_header(record, header);
    Ok(())
}

/// A typed handle on the collection of record type `T`.
///
/// Obtained from [`Database::collection`]. The handle is cheap; it holds the
/// resolved collection name and a reference to the database.
///
/// # Example
///
/// ```rust,ignore
/// use docgraph_core::query::{Filters, FindOptions, Sort};
///
/// let identities = db.collection::<Identity>();
/// identities.ensure_collection()?;
///
/// let mut alice = Identity::new("Alice");
/// identities.save(&mut alice, &SaveContext::new())?;
///
/// let found = identities.find_one(Filters::new().eq("name", "Alice"), Sort::new(), true)?;
/// assert_eq!(found.key(), alice.key());
///
/// let sorted: Vec<Identity> = identities
///     .find(&FindOptions::new().sort(Sort::new().desc("name")))?
///     .to_list()?;
/// ```
pub struct Collection<'db, T: Model> {
    /// Owning database.
    db: &'db Database,
    /// Resolved collection name.
    name: String,
    /// Type marker.
    _marker: PhantomData<fn() -> T>,
}

impl<'db, T: Model> Collection<'db, T> {
    pub(crate) fn new(db: &'db Database) -> Self {
        Self {
            db,
            name: db.names().collection::<T>(),
            _marker: PhantomData,
        }
    }

    /// Returns the collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the `collection/key` identifier of `record`.
    pub fn identifier(&self, record: &T) -> Option<String> {
        record.key().map(|key| format!("{}/{}", self.name, key))
    }

    /// Saves a record.
    ///
    /// A record with an empty revision is inserted, anything else replaces
    /// the stored document at the record's revision.
    ///
    /// # Errors
    ///
    /// - [`CoreError::UniqueConstraint`] on a unique index violation
    /// - [`CoreError::Store`] with code 1200 when the stored revision moved on
    pub fn save(&self, record: &mut T, ctx: &SaveContext) -> CoreResult<()> {
        persist(self.db, &self.name, record, ctx, SaveTarget::Collection)
    }

    /// Loads the record stored under `key`.
    pub fn load(&self, key: &str) -> CoreResult<T> {
        let document = self
            .db
            .store()
            .get(&self.name, key)
            .map_err(|err| translate(err, Operation::Collection, &self.name))?
            .ok_or_else(|| {
                CoreError::model_not_found(format!(
                    "no '{}' found with _key '{}'",
                    T::type_name(),
                    key
                ))
            })?;
        from_document(document.into())
    }

    /// Overwrites `record` with its stored state.
    pub fn reload(&self, record: &mut T) -> CoreResult<()> {
        let key = record.key().map(str::to_string).ok_or_else(|| {
            CoreError::model_not_found(format!("can't reload '{}' without a key", T::type_name()))
        })?;
        *record = self.load(&key)?;
        Ok(())
    }

    /// Deletes a record.
    ///
    /// Returns false if the record was missing and `ignore_missing` is set.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::ModelNotFound`] if the record is missing and
    /// `ignore_missing` is not set.
    pub fn delete(&self, record: &T, ignore_missing: bool) -> CoreResult<bool> {
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

        let deleted = self
            .db
            .store()
            .delete(&self.name, key, rev, ignore_missing)
            .map_err(|err| {
                translate(err, Operation::Delete, &format!("{}/{}", self.name, key))
            })?;
        debug!(collection = %self.name, key, deleted, "deleted record");
        Ok(deleted)
    }

    /// Runs a find query.
    pub fn find(&self, options: &FindOptions) -> CoreResult<Cursor<'db, T>> {
        let query = build_find_query(&self.name, options, self.db.names())?;
        debug!(collection = %self.name, query = %query.text, "executing find");
        let batch = self
            .db
            .store()
            .execute(&query)
            .map_err(|err| translate(err, Operation::Collection, &self.name))?;
        Ok(Cursor::new(self.db.store(), batch))
    }

    /// Finds at most one matching record.
    ///
    /// # Errors
    ///
    /// - [`CoreError::ModelNotFound`] if nothing matches
    /// - [`CoreError::MultipleModelsFound`] if `raise_on_multiple` is set
    ///   and more than one record matches
    pub fn find_one(&self, filters: Filters, sort: Sort, raise_on_multiple: bool) -> CoreResult<T> {
        let limit = if raise_on_multiple { 2 } else { 1 };
        let options = FindOptions::new().filters(filters).sort(sort).limit(limit);
        let results = self.find(&options)?.to_list()?;

        if raise_on_multiple && results.len() > 1 {
            return Err(CoreError::multiple_models_found(format!(
                "multiple '{}' matched given filters",
                T::type_name()
            )));
        }
        results.into_iter().next().ok_or_else(|| {
            CoreError::model_not_found(format!("no '{}' matched given filters", T::type_name()))
        })
    }

    /// Returns every record, optionally skipping and limiting.
    pub fn all(&self, limit: Option<usize>, skip: Option<usize>) -> CoreResult<Vec<T>> {
        let skip = skip.unwrap_or(0);
        match limit {
            Some(limit) => self
                .find(&FindOptions::new().limit(limit).offset(skip))?
                .to_list(),
            None => {
                let mut cursor = self.find(&FindOptions::new())?;
                let records = cursor.by_ref().skip(skip).collect::<CoreResult<Vec<T>>>()?;
                cursor.close(true)?;
                Ok(records)
            }
        }
    }

    /// Returns every key in the collection.
    pub fn keys(&self) -> CoreResult<Vec<String>> {
        self.db
            .store()
            .keys(&self.name)
            .map_err(|err| translate(err, Operation::Collection, &self.name))
    }

    /// Returns every identifier in the collection.
    pub fn ids(&self) -> CoreResult<Vec<String>> {
        Ok(self
            .keys()?
            .into_iter()
            .map(|key| format!("{}/{}", self.name, key))
            .collect())
    }

    /// Loads the records stored under `keys`, skipping missing ones.
    pub fn get_many(&self, keys: &[String]) -> CoreResult<Vec<T>> {
        self.db
            .store()
            .get_many(&self.name, keys)
            .map_err(|err| translate(err, Operation::Collection, &self.name))?
            .into_iter()
            .map(|document| from_document(document.into()))
            .collect()
    }

    /// Inserts new records in one call.
    ///
    /// Every stored record receives its key and revision, even when other
    /// records fail. The first failure is returned.
    pub fn insert_many(&self, records: &mut [T], ctx: &SaveContext) -> CoreResult<()> {
        let mut documents = Vec::with_capacity(records.len());
        for record in records.iter_mut() {
            if T::KIND == RecordKind::Vertex && record.key().is_none() {
                if let Some(generate) = &self.db.config().key_generator {
                    record.meta_mut().key = Some(generate());
                }
            }
            record.before_save(true, ctx)?;
            documents.push(to_document(record, &self.name, self.db.names())?);
        }

        let results = self.db.store().insert_many(&self.name, documents);
        if results.len() != records.len() {
            return Err(CoreError::invalid_query(format!(
                "insert of {} '{}' reported {} results",
                records.len(),
                T::type_name(),
                results.len()
            )));
        }

        let mut first_error = None;
        let mut stored = 0;
        for (record, result) in records.iter_mut().zip(results) {
            match result {
                Ok(header) => {
                    apply_header(record, header);
                    stored += 1;
                }
                Err(err) if first_error.is_none() => first_error = Some(err),
                Err(_) => {}
            }
        }
        debug!(collection = %self.name, stored, total = records.len(), "inserted records");
        match first_error {
            Some(err) => Err(translate(err, Operation::Save, T::type_name())),
            None => Ok(()),
        }
    }

    /// Returns the number of records in the collection.
    pub fn count(&self) -> CoreResult<usize> {
        self.db
            .store()
            .count(&self.name)
            .map_err(|err| translate(err, Operation::Collection, &self.name))
    }

    /// Creates the collection if it does not exist.
    ///
    /// Edge records get an edge collection with store-assigned keys.
    pub fn ensure_collection(&self) -> CoreResult<()> {
        let store = self.db.store();
        if store.has_collection(&self.name)? {
            return Ok(());
        }
        let options = match T::KIND {
            RecordKind::Vertex => CollectionOptions::default(),
            RecordKind::Edge => CollectionOptions::edge(),
        };
        match store.create_collection(&self.name, &options) {
            Ok(()) => {
                debug!(collection = %self.name, ?options, "created collection");
                Ok(())
            }
            Err(err) if err.has_code(codes::DUPLICATE_NAME) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Creates an index unless an identical one exists.
    pub fn ensure_index(&self, index: &IndexSpec) -> CoreResult<()> {
        self.db
            .store()
            .ensure_index(&self.name, index)
            .map_err(|err| translate(err, Operation::Collection, &self.name))
    }

    /// Drops the collection.
    ///
    /// Returns false if it did not exist and `ignore_missing` is set.
    pub fn delete_collection(&self, ignore_missing: bool) -> CoreResult<bool> {
        self.db
            .store()
            .delete_collection(&self.name, ignore_missing)
            .map_err(|err| translate(err, Operation::Collection, &self.name))
    }

    /// Removes every record.
    ///
    /// Returns false if the collection did not exist and `ignore_missing`
    /// is set.
    pub fn truncate_collection(&self, ignore_missing: bool) -> CoreResult<bool> {
        match self.db.store().truncate_collection(&self.name) {
            Ok(()) => Ok(true),
            Err(err) if ignore_missing && err.has_code(codes::DATA_SOURCE_NOT_FOUND) => Ok(false),
            Err(err) => Err(translate(err, Operation::Collection, &self.name)),
        }
    }

    /// Returns the lock name of the record stored under `key`.
    pub fn lock_name(&self, key: &str) -> String {
        format!("{}{}_{}", self.db.config().lock_name_prefix, self.name, key)
    }

    /// Returns the named lock of the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::Config`] when no lock backend is configured.
    pub fn lock(&self, key: &str) -> CoreResult<NamedLock> {
        let backend = self.db.config().lock_backend.clone().ok_or_else(|| {
            CoreError::config("trying to get a lock when no lock backend is configured")
        })?;
        Ok(NamedLock::new(backend, self.lock_name(key)))
    }

    /// Locks the record stored under `key` and loads it.
    ///
    /// The lock is released when the returned value is dropped, or right
    /// away if loading fails.
    pub fn lock_and_load(&self, key: &str) -> CoreResult<Locked<T>> {
        let guard = self.lock(key)?.acquire()?;
        let record = self.load(key)?;
        Ok(Locked::new(record, guard))
    }

    /// Locks `record` and reloads it in place.
    pub fn lock_and_reload(&self, record: &mut T) -> CoreResult<LockGuard> {
        let key = record.key().map(str::to_string).ok_or_else(|| {
            CoreError::model_not_found(format!("can't lock '{}' without a key", T::type_name()))
        })?;
        let guard = self.lock(&key)?.acquire()?;
        self.reload(record)?;
        Ok(guard)
    }
}

impl<T: Model> fmt::Debug for Collection<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("model", &T::type_name())
            .finish()
    }
}

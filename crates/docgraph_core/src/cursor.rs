//! Typed result cursors.

use crate::collection::codec::from_document;
use crate::error::{translate, CoreError, CoreResult, Operation};
use crate::model::Model;
use docgraph_store::{CursorBatch, DocumentStore};
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, warn};

/// The result of [`Cursor::close`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The server-side cursor was released.
    Closed,
    /// The server-side cursor was already gone.
    AlreadyGone,
    /// The results fit in one batch; there was no server-side cursor.
    NothingToClose,
}

/// A lazy, forward-only stream of query results decoded as `T`.
///
/// Further batches are fetched from the store only when the buffered ones
/// are consumed. The server-side cursor is released when the cursor is
/// dropped, with a missing cursor ignored.
///
/// ```rust,ignore
/// let mut cursor = people.find(FindOptions::new().limit(1).full_count(true))?;
/// let first = cursor.to_list()?;
/// assert_eq!(cursor.full_count()?, 2);
/// ```
pub struct Cursor<'db, T: Model> {
    store: &'db dyn DocumentStore,
    id: Option<String>,
    buffer: VecDeque<Value>,
    has_more: bool,
    count: Option<usize>,
    full_count: Option<usize>,
    released: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<'db, T: Model> Cursor<'db, T> {
    pub(crate) fn new(store: &'db dyn DocumentStore, batch: CursorBatch) -> Self {
        Self {
            store,
            id: batch.id,
            buffer: batch.items.into(),
            has_more: batch.has_more,
            count: batch.count,
            full_count: batch.full_count,
            released: false,
            _marker: PhantomData,
        }
    }

    /// Returns the server-side cursor id, if the store kept one open.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the total number of results.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::Cursor`] unless the query requested `count`.
    pub fn count(&self) -> CoreResult<usize> {
        self.count.ok_or_else(|| {
            CoreError::cursor("cursor has no count, was the query run with count enabled?")
        })
    }

    /// Returns the number of matches the query had before its `LIMIT`.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::Cursor`] unless the query requested
    /// `full_count`.
    pub fn full_count(&self) -> CoreResult<usize> {
        self.full_count.ok_or_else(|| {
            CoreError::cursor("cursor statistics have no full count, was full_count enabled?")
        })
    }

    /// Releases the server-side cursor.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::CursorNotFound`] if the store no longer knows
    /// the cursor and `ignore_missing` is not set.
    pub fn close(&mut self, ignore_missing: bool) -> CoreResult<CloseOutcome> {
        let Some(id) = self.id.as_deref() else {
            self.released = true;
            return Ok(CloseOutcome::NothingToClose);
        };

        let outcome = match self.store.close_cursor(id) {
            Ok(()) => CloseOutcome::Closed,
            Err(err) => match translate(err, Operation::Cursor, id) {
                CoreError::CursorNotFound { .. } if ignore_missing => CloseOutcome::AlreadyGone,
                err => return Err(err),
            },
        };
        debug!(cursor = id, ?outcome, "closed cursor");
        self.released = true;
        Ok(outcome)
    }

    /// Collects the remaining results and closes the cursor.
    ///
    /// Counts stay readable afterwards.
    pub fn to_list(&mut self) -> CoreResult<Vec<T>> {
        let items = self.by_ref().collect::<CoreResult<Vec<T>>>()?;
        self.close(true)?;
        Ok(items)
    }

    fn fetch(&mut self) -> CoreResult<()> {
        let Some(id) = self.id.as_deref() else {
            self.has_more = false;
            return Ok(());
        };
        let batch = match self.store.next_batch(id) {
            Ok(batch) => batch,
            Err(err) => {
                self.has_more = false;
                return Err(translate(err, Operation::Cursor, id));
            }
        };
        debug!(cursor = id, items = batch.items.len(), "fetched cursor batch");
        self.buffer.extend(batch.items);
        self.has_more = batch.has_more;
        Ok(())
    }
}

impl<T: Model> Iterator for Cursor<'_, T> {
    type Item = CoreResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(document) = self.buffer.pop_front() {
                return Some(from_document(document));
            }
            if !self.has_more {
                return None;
            }
            if let Err(err) = self.fetch() {
                return Some(Err(err));
            }
        }
    }
}

impl<T: Model> Drop for Cursor<'_, T> {
    fn drop(&mut self) {
        if self.released || self.id.is_none() {
            return;
        }
        if let Err(err) = self.close(true) {
            warn!(cursor = ?self.id, error = %err, "failed to close cursor");
        }
    }
}

impl<T: Model> fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("model", &T::type_name())
            .field("id", &self.id)
            .field("buffered", &self.buffer.len())
            .field("has_more", &self.has_more)
            .finish()
    }
}

//! Named locks.
//!
//! A [`NamedLock`] names a critical section shared by every process using
//! the same [`LockBackend`]. Acquiring it yields a [`LockGuard`] that
//! releases the lock when dropped:
//!
//! ```rust,ignore
//! let people = db.collection::<Person>();
//! {
//!     let mut alice = people.lock_and_load("alice")?;
//!     alice.name = "Alice B.".into();
//!     people.save(&mut alice, &SaveContext::new())?;
//! } // released here
//! ```

mod store_backend;

pub use store_backend::{
    StoreLockBackend, DEFAULT_LOCK_COLLECTION, DEFAULT_POLL_DELAY, LOCK_TTL,
};

use crate::error::{CoreError, CoreResult};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::{debug, warn};

/// A distributed lock service.
///
/// # Invariants
///
/// - At most one caller holds a given name at a time
/// - `acquire(name, true)` returns only once the lock is held
/// - Backends must be `Send + Sync` for concurrent access
pub trait LockBackend: Send + Sync {
    /// Acquires the lock `name`.
    ///
    /// Returns false if the lock is held elsewhere and `block` is not set.
    fn acquire(&self, name: &str, block: bool) -> CoreResult<bool>;

    /// Releases the lock `name`. Releasing a lock that is not held is a
    /// no-op.
    fn release(&self, name: &str) -> CoreResult<()>;
}

/// A lock identified by name.
#[derive(Clone)]
pub struct NamedLock {
    backend: Arc<dyn LockBackend>,
    name: String,
}

impl NamedLock {
    /// Creates a lock handle. Nothing is acquired yet.
    pub fn new(backend: Arc<dyn LockBackend>, name: impl Into<String>) -> Self {
        Self {
            backend,
            name: name.into(),
        }
    }

    /// Returns the lock name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Acquires the lock, waiting while it is held elsewhere.
    pub fn acquire(&self) -> CoreResult<LockGuard> {
        if !self.backend.acquire(&self.name, true)? {
            return Err(CoreError::LockUnavailable {
                name: self.name.clone(),
            });
        }
        debug!(lock = %self.name, "acquired lock");
        Ok(LockGuard::new(self.backend.clone(), self.name.clone()))
    }

    /// Acquires the lock if it is free.
    pub fn try_acquire(&self) -> CoreResult<Option<LockGuard>> {
        if !self.backend.acquire(&self.name, false)? {
            debug!(lock = %self.name, "lock is held elsewhere");
            return Ok(None);
        }
        debug!(lock = %self.name, "acquired lock");
        Ok(Some(LockGuard::new(self.backend.clone(), self.name.clone())))
    }
}

impl fmt::Debug for NamedLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedLock").field("name", &self.name).finish()
    }
}

/// A held lock, released on drop.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard {
    backend: Arc<dyn LockBackend>,
    name: String,
    released: bool,
}

impl LockGuard {
    fn new(backend: Arc<dyn LockBackend>, name: String) -> Self {
        Self {
            backend,
            name,
            released: false,
        }
    }

    /// Returns the lock name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Releases the lock, reporting failures that drop would only log.
    pub fn release(mut self) -> CoreResult<()> {
        self.released = true;
        self.backend.release(&self.name)?;
        debug!(lock = %self.name, "released lock");
        Ok(())
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match self.backend.release(&self.name) {
            Ok(()) => debug!(lock = %self.name, "released lock"),
            Err(err) => warn!(lock = %self.name, error = %err, "failed to release lock"),
        }
    }
}

impl fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard")
            .field("name", &self.name)
            .field("released", &self.released)
            .finish()
    }
}

/// A record loaded while holding its lock.
///
/// Dereferences to the record. The lock is released when this is dropped.
#[derive(Debug)]
pub struct Locked<T> {
    record: T,
    guard: LockGuard,
}

impl<T> Locked<T> {
    pub(crate) fn new(record: T, guard: LockGuard) -> Self {
        Self { record, guard }
    }

    /// Returns the lock guard.
    pub fn guard(&self) -> &LockGuard {
        &self.guard
    }

    /// Releases the lock and returns the record.
    pub fn release(self) -> CoreResult<T> {
        self.guard.release()?;
        Ok(self.record)
    }

    /// Splits into the record and the still-held guard.
    pub fn into_parts(self) -> (T, LockGuard) {
        (self.record, self.guard)
    }
}

impl<T> Deref for Locked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.record
    }
}

impl<T> DerefMut for Locked<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.record
    }
}

//! Typed collection API.
//!
//! Provides [`Collection<T>`] for record persistence, queries, collection
//! management and per-record locks.

pub(crate) mod codec;
mod typed;

pub(crate) use typed::{persist, SaveTarget};
pub use typed::Collection;

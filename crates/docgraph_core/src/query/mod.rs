//! Query compilation.
//!
//! Filters and sorts are compiled into a single-collection statement in
//! which every literal value and every field path segment is a bind
//! variable:
//!
//! ```text
//! FOR i IN @@collection
//!     FILTER i.@field_0_0.@field_0_1 == @field_0_eq
//!         AND i.@field_1_0 >= @field_1_gte
//!     SORT i.@sort_0_0 DESC
//!     LIMIT 0, 10
//!     RETURN i
//! ```
//!
//! All compilation errors are raised before the store is called.

mod filters;
mod find;
mod operators;
mod path;
mod sort;

pub use filters::{compile_filters, Condition, Filters, Operand};
pub use find::{build_find_query, FindOptions, COLLECTION_BIND_VAR, INSTANCE_ALIAS};
pub use operators::Operator;
pub use path::split_field;
pub use sort::{compile_sort, Direction, Sort, ASCENDING, DESCENDING};

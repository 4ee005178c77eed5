//! Find query assembly.

use super::filters::{compile_filters, Filters};
use super::sort::{compile_sort, Sort};
use crate::error::{CoreError, CoreResult};
use crate::names::NameRegistry;
use docgraph_store::{Query, QueryOptions};
use serde_json::Value;

/// The loop variable of find queries.
pub const INSTANCE_ALIAS: &str = "i";

/// Bind variable holding the collection name.
pub const COLLECTION_BIND_VAR: &str = "@collection";

/// Options of a find query.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Conditions every result must satisfy.
    pub filters: Filters,
    /// Result ordering.
    pub sort: Sort,
    /// Maximum number of results.
    pub limit: Option<usize>,
    /// Number of results to skip; requires `limit`.
    pub offset: Option<usize>,
    /// Report the total number of results on the cursor.
    pub count: bool,
    /// Report the number of matches before `limit` on the cursor.
    pub full_count: bool,
    /// Number of results per server batch.
    pub batch_size: Option<usize>,
}

impl FindOptions {
    /// Creates options matching every record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filters.
    #[must_use]
    pub fn filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    /// Sets the sort.
    #[must_use]
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    /// Sets the result limit.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the offset.
    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Requests the result count.
    #[must_use]
    pub fn count(mut self, count: bool) -> Self {
        self.count = count;
        self
    }

    /// Requests the full count.
    #[must_use]
    pub fn full_count(mut self, full_count: bool) -> Self {
        self.full_count = full_count;
        self
    }

    /// Sets the batch size.
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }
}

/// Builds the find query over `collection`.
///
/// ```text
/// FOR i IN @@collection
///     FILTER <term 0>
///         AND <term 1>
///     SORT <keys>
///     LIMIT <offset>, <limit>
///     RETURN i
/// ```
///
/// Clauses without content are left out.
///
/// # Errors
///
/// Fails before any store call on invalid filters or sort, and with
/// [`CoreError::InvalidQuery`] for a non-zero offset without a limit.
pub fn build_find_query(
    collection: &str,
    options: &FindOptions,
    names: &NameRegistry,
) -> CoreResult<Query> {
    let (expressions, mut bind_vars) = compile_filters(&options.filters, INSTANCE_ALIAS, names)?;

    let filter_clause = if expressions.is_empty() {
        String::new()
    } else {
        format!("FILTER {}", expressions.join("\n        AND "))
    };

    let limit_clause = match (options.limit, options.offset) {
        (Some(limit), offset) => format!("LIMIT {}, {}", offset.unwrap_or(0), limit),
        (None, Some(offset)) if offset > 0 => {
            return Err(CoreError::invalid_query(
                "offset is only supported together with limit",
            ));
        }
        (None, _) => String::new(),
    };

    let (sort_clause, sort_vars) = compile_sort(&options.sort, INSTANCE_ALIAS)?;
    bind_vars.extend(sort_vars);
    bind_vars.insert(
        COLLECTION_BIND_VAR.to_string(),
        Value::String(collection.to_string()),
    );

    let lines = [
        format!("FOR {} IN @@collection", INSTANCE_ALIAS),
        format!("    {}", filter_clause),
        format!("    {}", sort_clause),
        format!("    {}", limit_clause),
        format!("    RETURN {}", INSTANCE_ALIAS),
    ];
    let text = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n");

    Ok(Query::new(text, bind_vars).with_options(QueryOptions {
        count: options.count,
        full_count: options.full_count,
        batch_size: options.batch_size,
    }))
}

//! Sort compilation.

use super::path::split_field;
use crate::error::{CoreError, CoreResult};
use docgraph_store::BindVars;
use std::fmt;

/// Ascending sort direction token.
pub const ASCENDING: &str = "ASC";
/// Descending sort direction token.
pub const DESCENDING: &str = "DESC";

/// A sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

impl Direction {
    /// Parses a direction token, ignoring case.
    pub fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case(ASCENDING) {
            Some(Direction::Asc)
        } else if token.eq_ignore_ascii_case(DESCENDING) {
            Some(Direction::Desc)
        } else {
            None
        }
    }

    /// The direction as written in query text.
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => ASCENDING,
            Direction::Desc => DESCENDING,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered sort specification of `(field path, direction token)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sort {
    keys: Vec<(String, String)>,
}

impl Sort {
    /// Creates an empty sort specification.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sort key with a direction token.
    ///
    /// The token is checked when the sort is compiled.
    #[must_use]
    pub fn by(mut self, path: impl Into<String>, direction: impl Into<String>) -> Self {
        self.keys.push((path.into(), direction.into()));
        self
    }

    /// Appends an ascending sort key.
    #[must_use]
    pub fn asc(self, path: impl Into<String>) -> Self {
        self.by(path, ASCENDING)
    }

    /// Appends a descending sort key.
    #[must_use]
    pub fn desc(self, path: impl Into<String>) -> Self {
        self.by(path, DESCENDING)
    }

    /// Returns true if there are no sort keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<P: Into<String>, D: Into<String>> FromIterator<(P, D)> for Sort {
    fn from_iter<I: IntoIterator<Item = (P, D)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Sort::new(), |sort, (path, direction)| sort.by(path, direction))
    }
}

/// Compiles a sort specification into a `SORT` clause over `alias`.
///
/// Key `i` binds its path segments as `sort_<i>_<j>`. An empty
/// specification yields an empty clause.
///
/// # Errors
///
/// Fails with [`CoreError::InvalidSortDirection`] for a token other than
/// `ASC` or `DESC`.
pub fn compile_sort(sort: &Sort, alias: &str) -> CoreResult<(String, BindVars)> {
    if sort.is_empty() {
        return Ok((String::new(), BindVars::new()));
    }

    let mut terms = Vec::with_capacity(sort.keys.len());
    let mut bind_vars = BindVars::new();

    for (i, (path, token)) in sort.keys.iter().enumerate() {
        let direction =
            Direction::parse(token).ok_or_else(|| CoreError::InvalidSortDirection {
                field: path.clone(),
                direction: token.clone(),
            })?;

        let (expr, vars) = split_field(path, &format!("sort_{}", i));
        if vars.is_empty() {
            return Err(CoreError::invalid_query(format!(
                "sort path '{}' has no segments",
                path
            )));
        }
        bind_vars.extend(vars);
        terms.push(format!("{}.{} {}", alias, expr, direction));
    }

    Ok((format!("SORT {}", terms.join(", ")), bind_vars))
}

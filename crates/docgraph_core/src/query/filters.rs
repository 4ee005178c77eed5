//! Predicate compilation.

use super::operators::Operator;
use super::path::split_field;
use crate::error::{CoreError, CoreResult};
use crate::model::{Endpoint, Model};
use crate::names::NameRegistry;
use docgraph_store::BindVars;
use serde_json::Value;

/// The right-hand side of a filter term.
#[derive(Debug, Clone)]
pub enum Operand {
    /// A literal value.
    Value(Value),
    /// A record reference, bound as the record's `_id`.
    ///
    /// A reference whose record has no key binds `null`.
    Record(Endpoint),
}

impl Operand {
    /// References a record by its identifier.
    pub fn record<T: Model>(record: &T) -> Self {
        Operand::Record(Endpoint::to(record))
    }

    fn resolve(&self, names: &NameRegistry) -> Value {
        match self {
            Operand::Value(value) => value.clone(),
            Operand::Record(endpoint) => endpoint
                .resolve(names)
                .map(Value::String)
                .unwrap_or(Value::Null),
        }
    }
}

macro_rules! operand_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(value: $ty) -> Self {
                    Operand::Value(Value::from(value))
                }
            }
        )*
    };
}

operand_from!(Value, &str, String, bool, i32, i64, u32, u64, f64);

impl From<Endpoint> for Operand {
    fn from(endpoint: Endpoint) -> Self {
        Operand::Record(endpoint)
    }
}

impl<T: Into<Value>> From<Option<T>> for Operand {
    fn from(value: Option<T>) -> Self {
        Operand::Value(value.map_or(Value::Null, Into::into))
    }
}

/// The condition placed on one field.
#[derive(Debug, Clone)]
pub enum Condition {
    /// The field must equal the operand.
    Literal(Operand),
    /// Every `(operator symbol, operand)` pair must hold.
    Operators(Vec<(String, Operand)>),
}

/// An ordered filter specification: field path to condition.
///
/// Terms are compiled in insertion order and combined with `AND`.
///
/// ```rust
/// use docgraph_core::query::Filters;
///
/// let filters = Filters::new()
///     .eq("owner.name", "John")
///     .op("founded", ">=", 2000);
/// assert_eq!(filters.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Filters {
    terms: Vec<(String, Condition)>,
}

impl Filters {
    /// Creates an empty filter specification.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `path` to equal `value`, replacing any condition on `path`.
    #[must_use]
    pub fn eq(mut self, path: impl Into<String>, value: impl Into<Operand>) -> Self {
        let path = path.into();
        let condition = Condition::Literal(value.into());
        match self.terms.iter_mut().find(|(p, _)| *p == path) {
            Some((_, existing)) => *existing = condition,
            None => self.terms.push((path, condition)),
        }
        self
    }

    /// Adds `path <symbol> value` to the conditions on `path`.
    ///
    /// A symbol already present on `path` has its operand replaced, so each
    /// operator appears at most once per field. The symbol is checked when
    /// the filters are compiled.
    #[must_use]
    pub fn op(
        mut self,
        path: impl Into<String>,
        symbol: impl AsRef<str>,
        value: impl Into<Operand>,
    ) -> Self {
        let path = path.into();
        let pair = (symbol.as_ref().to_string(), value.into());
        let Some((_, existing)) = self.terms.iter_mut().find(|(p, _)| *p == path) else {
            self.terms.push((path, Condition::Operators(vec![pair])));
            return self;
        };
        if let Condition::Literal(operand) = existing {
            let literal = (Operator::Eq.symbol().to_string(), operand.clone());
            *existing = Condition::Operators(vec![literal]);
        }
        if let Condition::Operators(pairs) = existing {
            match pairs.iter_mut().find(|(s, _)| *s == pair.0) {
                Some(slot) => *slot = pair,
                None => pairs.push(pair),
            }
        }
        self
    }

    /// Returns the number of filtered fields.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns true if there are no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterates over the terms in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.terms.iter().map(|(p, c)| (p.as_str(), c))
    }
}

/// Compiles filters into `FILTER` expressions over `alias`.
///
/// Term `i` binds its path segments as `field_<i>_<j>` and each operand
/// as `field_<i>_<token>`. A literal condition compiles exactly like an
/// explicit `==`.
///
/// # Errors
///
/// Fails with [`CoreError::UnsupportedOperator`] for unknown operator
/// symbols and [`CoreError::InvalidQuery`] for paths without segments.
pub fn compile_filters(
    filters: &Filters,
    alias: &str,
    names: &NameRegistry,
) -> CoreResult<(Vec<String>, BindVars)> {
    let mut expressions = Vec::new();
    let mut bind_vars = BindVars::new();

    for (i, (path, condition)) in filters.iter().enumerate() {
        let pairs: Vec<(&str, &Operand)> = match condition {
            Condition::Literal(operand) => vec![(Operator::Eq.symbol(), operand)],
            Condition::Operators(pairs) => pairs.iter().map(|(s, o)| (s.as_str(), o)).collect(),
        };

        let prefix = format!("field_{}", i);
        let (field_expr, field_vars) = split_field(path, &prefix);
        if field_vars.is_empty() {
            return Err(CoreError::invalid_query(format!(
                "field path '{}' has no segments",
                path
            )));
        }
        bind_vars.extend(field_vars);

        for (symbol, operand) in pairs {
            let operator =
                Operator::from_symbol(symbol).ok_or_else(|| CoreError::UnsupportedOperator {
                    field: path.to_string(),
                    operator: symbol.to_string(),
                })?;

            let value_var = format!("{}_{}", prefix, operator.token());
            bind_vars.insert(value_var.clone(), operand.resolve(names));
            expressions.push(format!(
                "{}.{} {} @{}",
                alias,
                field_expr,
                operator.symbol(),
                value_var
            ));
        }
    }

    Ok((expressions, bind_vars))
}

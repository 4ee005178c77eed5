//! Query evaluation for the in-memory store.
//!
//! The in-memory store understands the single-collection statement shape
//! emitted by the docgraph query compiler:
//!
//! ```text
//! FOR i IN @@collection
//!     FILTER i.@field_0_0 == @field_0_eq
//!         AND i.@field_1_0 ANY >= @field_1_any_gte
//!     SORT i.@sort_0_0 DESC, i.@sort_1_0 ASC
//!     LIMIT 0, 10
//!     RETURN i
//! ```
//!
//! One clause per line. Attribute path segments and operands may be bind
//! parameters or literals.

use super::value::{compare, lookup, Operator};
use crate::error::{codes, StoreError, StoreResult};
use crate::types::BindVars;
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
enum Term {
    Literal(Value),
    Bind(String),
}

#[derive(Debug, Clone)]
struct Condition {
    path: Vec<Term>,
    operator: Operator,
    operand: Term,
}

#[derive(Debug, Clone)]
struct SortKey {
    path: Vec<Term>,
    descending: bool,
}

/// A parsed query.
#[derive(Debug, Clone)]
pub(crate) struct Plan {
    source: Term,
    conditions: Vec<Condition>,
    sort: Vec<SortKey>,
    limit: Option<(usize, usize)>,
}

/// The documents produced by a plan.
#[derive(Debug)]
pub(crate) struct Evaluation {
    pub items: Vec<Value>,
    pub full_count: usize,
}

impl Plan {
    /// Parses query text.
    pub(crate) fn parse(text: &str) -> StoreResult<Self> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

        let header = lines
            .next()
            .ok_or_else(|| StoreError::query_parse("query is empty"))?;
        let (alias, source) = parse_for(header)?;

        let mut plan = Plan {
            source,
            conditions: Vec::new(),
            sort: Vec::new(),
            limit: None,
        };
        let mut returned = false;

        for line in lines {
            if returned {
                return Err(StoreError::query_parse(format!(
                    "unexpected clause after RETURN: {}",
                    line
                )));
            }
            if let Some(rest) = line.strip_prefix("FILTER ") {
                plan.conditions.push(parse_condition(&alias, rest)?);
            } else if let Some(rest) = line.strip_prefix("AND ") {
                if plan.conditions.is_empty() {
                    return Err(StoreError::query_parse("AND without FILTER"));
                }
                plan.conditions.push(parse_condition(&alias, rest)?);
            } else if let Some(rest) = line.strip_prefix("SORT ") {
                for key in rest.split(',') {
                    plan.sort.push(parse_sort_key(&alias, key)?);
                }
            } else if let Some(rest) = line.strip_prefix("LIMIT ") {
                plan.limit = Some(parse_limit(rest)?);
            } else if let Some(rest) = line.strip_prefix("RETURN ") {
                if rest.trim() != alias {
                    return Err(StoreError::query_parse(format!(
                        "can only return the loop variable '{}'",
                        alias
                    )));
                }
                returned = true;
            } else {
                return Err(StoreError::query_parse(format!("unsupported clause: {}", line)));
            }
        }

        if !returned {
            return Err(StoreError::query_parse("query has no RETURN clause"));
        }
        Ok(plan)
    }

    /// Resolves the collection name the plan iterates over.
    pub(crate) fn collection(&self, bind_vars: &BindVars) -> StoreResult<String> {
        resolve_name(&self.source, bind_vars)
    }

    /// Filters, sorts and limits `documents`.
    pub(crate) fn evaluate(
        &self,
        documents: Vec<Value>,
        bind_vars: &BindVars,
    ) -> StoreResult<Evaluation> {
        let mut conditions = Vec::with_capacity(self.conditions.len());
        for condition in &self.conditions {
            conditions.push((
                resolve_path(&condition.path, bind_vars)?,
                condition.operator,
                resolve_value(&condition.operand, bind_vars)?,
            ));
        }

        let mut matched: Vec<Value> = documents
            .into_iter()
            .filter(|doc| {
                conditions
                    .iter()
                    .all(|(path, op, operand)| op.apply(lookup(doc, path), operand))
            })
            .collect();

        if !self.sort.is_empty() {
            let mut keys = Vec::with_capacity(self.sort.len());
            for key in &self.sort {
                keys.push((resolve_path(&key.path, bind_vars)?, key.descending));
            }
            matched.sort_by(|a, b| {
                for (path, descending) in &keys {
                    let ordering = compare(lookup(a, path), lookup(b, path));
                    let ordering = if *descending {
                        ordering.reverse()
                    } else {
                        ordering
                    };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
        }

        let full_count = matched.len();
        let items = match self.limit {
            Some((offset, count)) => matched.into_iter().skip(offset).take(count).collect(),
            None => matched,
        };

        Ok(Evaluation { items, full_count })
    }
}

fn parse_for(line: &str) -> StoreResult<(String, Term)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        ["FOR", alias, "IN", source] => {
            let source = match source.strip_prefix("@@") {
                Some(name) => Term::Bind(format!("@{}", name)),
                None => Term::Literal(Value::String((*source).to_string())),
            };
            Ok((alias.to_string(), source))
        }
        _ => Err(StoreError::query_parse(format!("expected FOR clause, got: {}", line))),
    }
}

fn parse_condition(alias: &str, text: &str) -> StoreResult<Condition> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 3 {
        return Err(StoreError::query_parse(format!("incomplete condition: {}", text)));
    }
    let symbol = tokens[1..tokens.len() - 1].join(" ");
    let operator = Operator::parse(&symbol)
        .ok_or_else(|| StoreError::query_parse(format!("unknown operator: {}", symbol)))?;

    Ok(Condition {
        path: parse_path(alias, tokens[0])?,
        operator,
        operand: parse_operand(tokens[tokens.len() - 1])?,
    })
}

fn parse_sort_key(alias: &str, text: &str) -> StoreResult<SortKey> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let (path, descending) = match tokens.as_slice() {
        [path] => (path, false),
        [path, direction] if direction.eq_ignore_ascii_case("ASC") => (path, false),
        [path, direction] if direction.eq_ignore_ascii_case("DESC") => (path, true),
        _ => {
            return Err(StoreError::query_parse(format!("invalid sort key: {}", text.trim())));
        }
    };
    Ok(SortKey {
        path: parse_path(alias, path)?,
        descending,
    })
}

fn parse_limit(text: &str) -> StoreResult<(usize, usize)> {
    let parse = |part: &str| {
        part.trim()
            .parse::<usize>()
            .map_err(|_| StoreError::query_parse(format!("invalid LIMIT value: {}", part.trim())))
    };
    match text.split_once(',') {
        Some((offset, count)) => Ok((parse(offset)?, parse(count)?)),
        None => Ok((0, parse(text)?)),
    }
}

fn parse_path(alias: &str, text: &str) -> StoreResult<Vec<Term>> {
    let mut parts = text.split('.');
    if parts.next() != Some(alias) {
        return Err(StoreError::query_parse(format!(
            "attribute path must start with '{}': {}",
            alias, text
        )));
    }
    let path: Vec<Term> = parts
        .map(|part| match part.strip_prefix('@') {
            Some(name) => Term::Bind(name.to_string()),
            None => Term::Literal(Value::String(part.to_string())),
        })
        .collect();
    if path.is_empty() {
        return Err(StoreError::query_parse(format!("empty attribute path: {}", text)));
    }
    Ok(path)
}

fn parse_operand(token: &str) -> StoreResult<Term> {
    match token.strip_prefix('@') {
        Some(name) => Ok(Term::Bind(name.to_string())),
        None => serde_json::from_str(token)
            .map(Term::Literal)
            .map_err(|_| StoreError::query_parse(format!("invalid operand: {}", token))),
    }
}

fn resolve_value(term: &Term, bind_vars: &BindVars) -> StoreResult<Value> {
    match term {
        Term::Literal(value) => Ok(value.clone()),
        Term::Bind(name) => bind_vars.get(name).cloned().ok_or_else(|| {
            StoreError::server(
                codes::QUERY_BIND_PARAMETER_MISSING,
                format!("bind parameter '{}' was not declared in the query", name),
            )
        }),
    }
}

fn resolve_name(term: &Term, bind_vars: &BindVars) -> StoreResult<String> {
    match resolve_value(term, bind_vars)? {
        Value::String(name) => Ok(name),
        other => Err(StoreError::query_parse(format!(
            "expected a name, got bind value {}",
            other
        ))),
    }
}

fn resolve_path(path: &[Term], bind_vars: &BindVars) -> StoreResult<Vec<String>> {
    path.iter().map(|term| resolve_name(term, bind_vars)).collect()
}

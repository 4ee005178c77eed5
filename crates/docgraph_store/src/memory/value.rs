//! Value semantics of the in-memory store: ordering, attribute lookup and
//! the comparison operators understood by the query evaluator.

use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;

static NULL: Value = Value::Null;

/// Scalar comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Comparison {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Comparison {
    fn parse(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "==" => Comparison::Eq,
            "!=" => Comparison::Ne,
            "<" => Comparison::Lt,
            "<=" => Comparison::Lte,
            ">" => Comparison::Gt,
            ">=" => Comparison::Gte,
            _ => return None,
        })
    }

    fn holds(self, lhs: &Value, rhs: &Value) -> bool {
        let ordering = compare(lhs, rhs);
        match self {
            Comparison::Eq => ordering == Ordering::Equal,
            Comparison::Ne => ordering != Ordering::Equal,
            Comparison::Lt => ordering == Ordering::Less,
            Comparison::Lte => ordering != Ordering::Greater,
            Comparison::Gt => ordering == Ordering::Greater,
            Comparison::Gte => ordering != Ordering::Less,
        }
    }
}

/// Array quantifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Quantifier {
    Any,
    All,
    None,
}

/// The comparison applied to each element under a quantifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ElementTest {
    Compare(Comparison),
    In,
}

/// A binary filter operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operator {
    Compare(Comparison),
    In,
    NotIn,
    Like,
    NotLike,
    RegexMatch,
    NotRegexMatch,
    Quantified(Quantifier, ElementTest),
}

impl Operator {
    /// Parses an operator from its (whitespace-normalized) query text.
    pub(crate) fn parse(symbol: &str) -> Option<Self> {
        if let Some(cmp) = Comparison::parse(symbol) {
            return Some(Operator::Compare(cmp));
        }
        let op = match symbol {
            "IN" => Operator::In,
            "NOT IN" => Operator::NotIn,
            "LIKE" => Operator::Like,
            "NOT LIKE" => Operator::NotLike,
            "=~" => Operator::RegexMatch,
            "!~" => Operator::NotRegexMatch,
            _ => {
                let (quantifier, rest) = symbol.split_once(' ')?;
                let quantifier = match quantifier {
                    "ANY" => Quantifier::Any,
                    "ALL" => Quantifier::All,
                    "NONE" => Quantifier::None,
                    _ => return None,
                };
                let test = match rest {
                    "IN" => ElementTest::In,
                    other => ElementTest::Compare(Comparison::parse(other)?),
                };
                Operator::Quantified(quantifier, test)
            }
        };
        Some(op)
    }

    /// Evaluates `lhs <op> rhs`.
    pub(crate) fn apply(self, lhs: &Value, rhs: &Value) -> bool {
        match self {
            Operator::Compare(cmp) => cmp.holds(lhs, rhs),
            Operator::In => contains(rhs, lhs),
            Operator::NotIn => !contains(rhs, lhs),
            Operator::Like => like(lhs, rhs),
            Operator::NotLike => !like(lhs, rhs),
            Operator::RegexMatch => regex_match(lhs, rhs),
            Operator::NotRegexMatch => !regex_match(lhs, rhs),
            Operator::Quantified(quantifier, test) => {
                let Value::Array(items) = lhs else {
                    return false;
                };
                let check = |item: &Value| match test {
                    ElementTest::Compare(cmp) => cmp.holds(item, rhs),
                    ElementTest::In => contains(rhs, item),
                };
                match quantifier {
                    Quantifier::Any => items.iter().any(check),
                    Quantifier::All => items.iter().all(check),
                    Quantifier::None => !items.iter().any(check),
                }
            }
        }
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values: null < bool < number < string < array < object.
///
/// Arrays compare element by element (missing elements count as null),
/// objects compare attribute by attribute in sorted attribute order.
pub(crate) fn compare(a: &Value, b: &Value) -> Ordering {
    let (rank_a, rank_b) = (type_rank(a), type_rank(b));
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for i in 0..x.len().max(y.len()) {
                let ordering = compare(x.get(i).unwrap_or(&NULL), y.get(i).unwrap_or(&NULL));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        }
        (Value::Object(x), Value::Object(y)) => {
            let mut keys: Vec<&String> = x.keys().chain(y.keys()).collect();
            keys.sort();
            keys.dedup();
            for key in keys {
                let ordering = compare(x.get(key).unwrap_or(&NULL), y.get(key).unwrap_or(&NULL));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        }
        _ => Ordering::Equal,
    }
}

/// Follows an attribute path; missing attributes resolve to null.
pub(crate) fn lookup<'a>(document: &'a Value, path: &[String]) -> &'a Value {
    let mut current = document;
    for segment in path {
        current = match current {
            Value::Object(map) => map.get(segment).unwrap_or(&NULL),
            _ => &NULL,
        };
    }
    current
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    match haystack {
        Value::Array(items) => items
            .iter()
            .any(|item| compare(item, needle) == Ordering::Equal),
        _ => false,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Translates a `LIKE` pattern (`%` any run, `_` one character, `\` escape)
/// into an anchored regular expression.
pub(crate) fn like_to_regex(pattern: &str) -> String {
    let mut out = String::from("(?s)^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push_str(&regex::escape(&escaped.to_string()));
                }
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    out
}

fn like(lhs: &Value, pattern: &Value) -> bool {
    let Value::String(pattern) = pattern else {
        return false;
    };
    Regex::new(&like_to_regex(pattern))
        .map(|re| re.is_match(&as_text(lhs)))
        .unwrap_or(false)
}

fn regex_match(lhs: &Value, pattern: &Value) -> bool {
    let Value::String(pattern) = pattern else {
        return false;
    };
    Regex::new(pattern)
        .map(|re| re.is_match(&as_text(lhs)))
        .unwrap_or(false)
}

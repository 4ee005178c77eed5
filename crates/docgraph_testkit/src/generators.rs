//! Property-based test generators using proptest.
//!
//! Provides strategies for field paths, filter operands, operators, sort
//! directions and records.

use crate::fixtures::Identity;
use docgraph_core::query::Operator;
use proptest::prelude::*;
use serde_json::Value;

/// Strategy for a single field path segment.
pub fn segment_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z_][a-zA-Z0-9_]{0,11}").expect("Invalid regex")
}

/// Strategy for well-formed dotted field paths.
pub fn field_path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(segment_strategy(), 1..4).prop_map(|segments| segments.join("."))
}

/// Strategy for field paths with stray dots around and between segments.
///
/// Yields the messy path together with its normalized form.
pub fn messy_field_path_strategy() -> impl Strategy<Value = (String, String)> {
    (
        prop::collection::vec((segment_strategy(), 1usize..4), 1..4),
        0usize..3,
    )
        .prop_map(|(segments, leading)| {
            let mut messy = ".".repeat(leading);
            for (segment, dots) in &segments {
                messy.push_str(segment);
                messy.push_str(&".".repeat(*dots));
            }
            let clean = segments
                .into_iter()
                .map(|(segment, _)| segment)
                .collect::<Vec<_>>()
                .join(".");
            (messy, clean)
        })
}

/// Strategy for scalar JSON operands.
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(Value::from),
        prop::string::string_regex("[a-zA-Z0-9 ]{0,12}")
            .expect("Invalid regex")
            .prop_map(Value::String),
    ]
}

/// Strategy for any supported operator.
pub fn operator_strategy() -> impl Strategy<Value = Operator> {
    prop::sample::select(Operator::ALL.to_vec())
}

/// Strategy for sort direction tokens in mixed case.
pub fn direction_token_strategy() -> impl Strategy<Value = String> {
    (prop::sample::select(vec!["asc", "desc"]), any::<u8>()).prop_map(|(token, mask)| {
        token
            .chars()
            .enumerate()
            .map(|(i, c)| {
                if mask & (1 << i) != 0 {
                    c.to_ascii_uppercase()
                } else {
                    c
                }
            })
            .collect()
    })
}

/// Strategy for transient identities.
pub fn identity_strategy() -> impl Strategy<Value = Identity> {
    prop::string::string_regex("[A-Z][a-z]{1,10}")
        .expect("Invalid regex")
        .prop_map(Identity::new)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

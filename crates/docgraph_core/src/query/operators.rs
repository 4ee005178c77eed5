//! Filter operators.
//!
//! Each operator has the symbol written into the query text and a short
//! `a-z_` token used to name its operand's bind variable.

use std::fmt;

/// A supported filter operator.
///
/// The array quantifier forms (`ANY ==`, `ALL IN`, ...) treat the filtered
/// field as an array and apply the comparison to each element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    NotIn,
    Like,
    NotLike,
    RegMatch,
    NotRegMatch,
    AllIn,
    NoneIn,
    AnyIn,
    AnyEq,
    AnyNe,
    AnyLt,
    AnyLte,
    AnyGt,
    AnyGte,
    AllEq,
    AllNe,
    AllLt,
    AllLte,
    AllGt,
    AllGte,
    NoneEq,
    NoneNe,
    NoneLt,
    NoneLte,
    NoneGt,
    NoneGte,
}

impl Operator {
    /// Every supported operator.
    pub const ALL: [Operator; 33] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Lt,
        Operator::Lte,
        Operator::Gt,
        Operator::Gte,
        Operator::In,
        Operator::NotIn,
        Operator::Like,
        Operator::NotLike,
        Operator::RegMatch,
        Operator::NotRegMatch,
        Operator::AllIn,
        Operator::NoneIn,
        Operator::AnyIn,
        Operator::AnyEq,
        Operator::AnyNe,
        Operator::AnyLt,
        Operator::AnyLte,
        Operator::AnyGt,
        Operator::AnyGte,
        Operator::AllEq,
        Operator::AllNe,
        Operator::AllLt,
        Operator::AllLte,
        Operator::AllGt,
        Operator::AllGte,
        Operator::NoneEq,
        Operator::NoneNe,
        Operator::NoneLt,
        Operator::NoneLte,
        Operator::NoneGt,
        Operator::NoneGte,
    ];

    /// The operator as written in query text.
    pub const fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::RegMatch => "=~",
            Operator::NotRegMatch => "!~",
            Operator::AllIn => "ALL IN",
            Operator::NoneIn => "NONE IN",
            Operator::AnyIn => "ANY IN",
            Operator::AnyEq => "ANY ==",
            Operator::AnyNe => "ANY !=",
            Operator::AnyLt => "ANY <",
            Operator::AnyLte => "ANY <=",
            Operator::AnyGt => "ANY >",
            Operator::AnyGte => "ANY >=",
            Operator::AllEq => "ALL ==",
            Operator::AllNe => "ALL !=",
            Operator::AllLt => "ALL <",
            Operator::AllLte => "ALL <=",
            Operator::AllGt => "ALL >",
            Operator::AllGte => "ALL >=",
            Operator::NoneEq => "NONE ==",
            Operator::NoneNe => "NONE !=",
            Operator::NoneLt => "NONE <",
            Operator::NoneLte => "NONE <=",
            Operator::NoneGt => "NONE >",
            Operator::NoneGte => "NONE >=",
        }
    }

    /// The bind variable token of the operator.
    pub const fn token(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Like => "like",
            Operator::NotLike => "not_like",
            Operator::RegMatch => "reg_match",
            Operator::NotRegMatch => "not_reg_match",
            Operator::AllIn => "all_in",
            Operator::NoneIn => "none_in",
            Operator::AnyIn => "any_in",
            Operator::AnyEq => "any_eq",
            Operator::AnyNe => "any_ne",
            Operator::AnyLt => "any_lt",
            Operator::AnyLte => "any_lte",
            Operator::AnyGt => "any_gt",
            Operator::AnyGte => "any_gte",
            Operator::AllEq => "all_eq",
            Operator::AllNe => "all_ne",
            Operator::AllLt => "all_lt",
            Operator::AllLte => "all_lte",
            Operator::AllGt => "all_gt",
            Operator::AllGte => "all_gte",
            Operator::NoneEq => "none_eq",
            Operator::NoneNe => "none_ne",
            Operator::NoneLt => "none_lt",
            Operator::NoneLte => "none_lte",
            Operator::NoneGt => "none_gt",
            Operator::NoneGte => "none_gte",
        }
    }

    /// Looks up an operator by its symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl AsRef<str> for Operator {
    fn as_ref(&self) -> &str {
        self.symbol()
    }
}

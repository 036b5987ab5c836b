use std::fmt;
use std::str::FromStr;

use super::pattern::Pattern;
use super::Value;

/// Operators a structured condition can apply to a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionOp {
    Equals,
    Contains,
    Matches,
    StartsWith,
    EndsWith,
    InList,
    GreaterThan,
    LessThan,
}

impl ConditionOp {
    pub const ALL: [ConditionOp; 8] = [
        ConditionOp::Equals,
        ConditionOp::Contains,
        ConditionOp::Matches,
        ConditionOp::StartsWith,
        ConditionOp::EndsWith,
        ConditionOp::InList,
        ConditionOp::GreaterThan,
        ConditionOp::LessThan,
    ];

    /// The operator's name in configuration documents.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionOp::Equals => "equals",
            ConditionOp::Contains => "contains",
            ConditionOp::Matches => "matches",
            ConditionOp::StartsWith => "starts_with",
            ConditionOp::EndsWith => "ends_with",
            ConditionOp::InList => "in_list",
            ConditionOp::GreaterThan => "greater_than",
            ConditionOp::LessThan => "less_than",
        }
    }
}

impl fmt::Display for ConditionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionOp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConditionOp::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or(())
    }
}

/// A predicate over one record field, as written by the user.
///
/// Turned into a `CompiledCondition` when its rule is built; a `Matches`
/// operand is compiled to a [`Pattern`] at that point.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Bare value: the field must equal it.
    Literal(Value),
    Op { op: ConditionOp, operand: Value },
}

impl Condition {
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Condition::Literal(value.into())
    }

    #[must_use]
    pub fn op(op: ConditionOp, operand: impl Into<Value>) -> Self {
        Condition::Op {
            op,
            operand: operand.into(),
        }
    }

    #[must_use]
    pub fn equals(value: impl Into<Value>) -> Self {
        Self::op(ConditionOp::Equals, value)
    }

    #[must_use]
    pub fn contains(needle: impl Into<Value>) -> Self {
        Self::op(ConditionOp::Contains, needle)
    }

    /// Regular-expression search over the stringified field.
    #[must_use]
    pub fn matches(pattern: &str) -> Self {
        Self::op(ConditionOp::Matches, pattern)
    }

    #[must_use]
    pub fn starts_with(prefix: impl Into<Value>) -> Self {
        Self::op(ConditionOp::StartsWith, prefix)
    }

    #[must_use]
    pub fn ends_with(suffix: impl Into<Value>) -> Self {
        Self::op(ConditionOp::EndsWith, suffix)
    }

    #[must_use]
    pub fn in_list<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Self {
        Self::op(
            ConditionOp::InList,
            Value::List(items.into_iter().map(Into::into).collect()),
        )
    }

    #[must_use]
    pub fn greater_than(bound: impl Into<Value>) -> Self {
        Self::op(ConditionOp::GreaterThan, bound)
    }

    #[must_use]
    pub fn less_than(bound: impl Into<Value>) -> Self {
        Self::op(ConditionOp::LessThan, bound)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Literal(v) => write!(f, "== {v:?}"),
            Condition::Op { op, operand } => write!(f, "{op} {operand:?}"),
        }
    }
}

/// Operators evaluated against a plain operand. `Matches` has no
/// counterpart here; it compiles to a [`Pattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    InList,
    GreaterThan,
    LessThan,
}

impl CompareOp {
    /// `None` for [`ConditionOp::Matches`].
    pub(crate) fn from_op(op: ConditionOp) -> Option<Self> {
        match op {
            ConditionOp::Equals => Some(CompareOp::Equals),
            ConditionOp::Contains => Some(CompareOp::Contains),
            ConditionOp::StartsWith => Some(CompareOp::StartsWith),
            ConditionOp::EndsWith => Some(CompareOp::EndsWith),
            ConditionOp::InList => Some(CompareOp::InList),
            ConditionOp::GreaterThan => Some(CompareOp::GreaterThan),
            ConditionOp::LessThan => Some(CompareOp::LessThan),
            ConditionOp::Matches => None,
        }
    }
}

/// A condition ready for evaluation.
#[derive(Debug, Clone)]
pub(crate) enum CompiledCondition {
    Literal(Value),
    Compare { op: CompareOp, operand: Value },
    Matches(Pattern),
}

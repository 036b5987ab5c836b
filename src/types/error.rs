use thiserror::Error;

/// A rule definition that cannot be turned into a working rule.
///
/// Raised while building a [`RuleSet`](super::RuleSet) or a generic
/// [`Rule`](super::Rule), never while parsing or processing.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid pattern '{pattern}' in rule '{rule}': {source}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule '{rule}' declares no patterns")]
    NoPatterns { rule: String },

    #[error("pattern '{pattern}' in rule '{rule}' can match the empty string")]
    ZeroWidthPattern { rule: String, pattern: String },

    #[error("unknown condition operator '{operator}' on field '{field}' in rule '{rule}'")]
    UnknownOperator {
        rule: String,
        field: String,
        operator: String,
    },

    #[error("condition '{operator}' on field '{field}' in rule '{rule}' has no operand")]
    MissingOperand {
        rule: String,
        field: String,
        operator: String,
    },

    #[error("rule '{rule}' has no action")]
    MissingAction { rule: String },

    #[error("malformed {context}: {message}")]
    Malformed { context: String, message: String },
}

/// Invalid arguments handed to a public operation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("a rule set is required")]
    MissingRuleSet,

    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },
}

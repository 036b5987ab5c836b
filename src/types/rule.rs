use std::collections::BTreeMap;
use std::fmt;

use super::action::Action;
use super::condition::{CompiledCondition, Condition};
use super::content_rule::DEFAULT_PRIORITY;
use super::error::ConfigError;

/// A condition/action rule for the [`RuleEngine`](crate::RuleEngine).
///
/// Every condition must hold for the rule to match. Created with
/// [`Rule::builder()`] or loaded from a rule-engine configuration document;
/// immutable afterwards, with any `matches` pattern already compiled.
///
/// # Example
///
/// ```
/// use conventionalrp::{Action, Condition, Rule};
///
/// let rule = Rule::builder("critical_hit")
///     .priority(100)
///     .when("type", Condition::literal("dice_roll"))
///     .when("result", Condition::greater_than(19))
///     .then(Action::add_tag("critical"))
///     .build()
///     .unwrap();
/// assert_eq!(rule.priority(), 100);
/// ```
#[derive(Debug, Clone)]
pub struct Rule {
    pub(crate) name: String,
    pub(crate) priority: i64,
    pub(crate) conditions: Vec<(String, CompiledCondition)>,
    pub(crate) action: Action,
}

impl Rule {
    #[must_use]
    pub fn builder(name: &str) -> RuleBuilder {
        RuleBuilder {
            name: name.to_owned(),
            priority: DEFAULT_PRIORITY,
            conditions: BTreeMap::new(),
            action: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Higher priorities are evaluated first.
    #[must_use]
    pub fn priority(&self) -> i64 {
        self.priority
    }

    #[must_use]
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Fields this rule places a condition on.
    pub fn condition_fields(&self) -> impl Iterator<Item = &str> {
        self.conditions.iter().map(|(field, _)| field.as_str())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rule({}, priority {}, {} conditions, {})",
            self.name,
            self.priority,
            self.conditions.len(),
            self.action.kind()
        )
    }
}

/// Builder returned by [`Rule::builder()`].
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    pub(crate) name: String,
    pub(crate) priority: i64,
    pub(crate) conditions: BTreeMap<String, Condition>,
    pub(crate) action: Option<Action>,
}

impl RuleBuilder {
    /// Defaults to 50 when not called.
    #[must_use]
    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Add a condition on `field`. A second call for the same field replaces the first.
    #[must_use]
    pub fn when(mut self, field: &str, condition: Condition) -> Self {
        self.conditions.insert(field.to_owned(), condition);
        self
    }

    #[must_use]
    pub fn then(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    /// Compile the rule.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingAction`] if [`then()`](Self::then) was never called,
    /// [`ConfigError::InvalidPattern`] for a `matches` pattern that does not compile,
    /// [`ConfigError::MissingOperand`] for a `matches` operand that is not a string.
    pub fn build(self) -> Result<Rule, ConfigError> {
        crate::compile::compile_rule(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let rule = Rule::builder("tag_all")
            .then(Action::add_tag("seen"))
            .build()
            .unwrap();
        assert_eq!(rule.name(), "tag_all");
        assert_eq!(rule.priority(), DEFAULT_PRIORITY);
        assert_eq!(rule.condition_fields().count(), 0);
    }

    #[test]
    fn builder_without_action_fails() {
        let err = Rule::builder("r")
            .when("type", Condition::literal("dice_roll"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingAction { rule } if rule == "r"));
    }

    #[test]
    fn repeated_field_replaces_condition() {
        let rule = Rule::builder("r")
            .when("speaker", Condition::literal("DM"))
            .when("speaker", Condition::literal("GM"))
            .then(Action::add_tag("gm"))
            .build()
            .unwrap();
        assert_eq!(rule.condition_fields().collect::<Vec<_>>(), vec!["speaker"]);
    }

    #[test]
    fn display() {
        let rule = Rule::builder("upper")
            .priority(7)
            .when("type", Condition::literal("dialogue"))
            .then(Action::transform("content", "upper"))
            .build()
            .unwrap();
        assert_eq!(
            rule.to_string(),
            "Rule(upper, priority 7, 1 conditions, transform)"
        );
    }
}

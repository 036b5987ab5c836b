use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use tracing::{debug, info, trace};

use crate::config::EngineConfig;
use crate::types::{
    Action, CompareOp, CompiledCondition, ConfigError, ProcessReport, Record, Rule, Value,
    TAGS_FIELD,
};

impl Rule {
    /// Whether every condition of this rule holds for `record`.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions
            .iter()
            .all(|(field, condition)| condition_holds(condition, record.get(field)))
    }

    /// Apply this rule's action to a copy of `record`, regardless of whether it matches.
    #[must_use]
    pub fn apply(&self, record: &Record) -> Record {
        let mut result = record.clone();
        self.apply_in_place(&mut result);
        result
    }

    fn apply_in_place(&self, record: &mut Record) {
        match &self.action {
            Action::SetField { field, value } => {
                record.insert(field, value.clone());
            }
            Action::AddField { field, value } => {
                if !record.contains(field) {
                    record.insert(field, value.clone());
                }
            }
            Action::RemoveField { field } => {
                record.remove(field);
            }
            Action::Transform { field, function } => {
                let Some(current) = record.get(field) else {
                    return;
                };
                match function.apply(current) {
                    Ok(value) => {
                        record.insert(field, value);
                    }
                    Err(error) => debug!(
                        rule = self.name.as_str(),
                        field = field.as_str(),
                        %error,
                        "transform failed, value left unchanged"
                    ),
                }
            }
            Action::AddTag { tag } => {
                let mut tags = match record.remove(TAGS_FIELD) {
                    Some(Value::List(items)) => items,
                    Some(Value::Null) | None => Vec::new(),
                    Some(other) => vec![other],
                };
                if !tags.iter().any(|t| t.as_str() == Some(tag.as_str())) {
                    tags.push(Value::from(tag.as_str()));
                }
                record.insert(TAGS_FIELD, Value::List(tags));
            }
            Action::CopyField { source, target } => {
                if let Some(value) = record.get(source).cloned() {
                    record.insert(target, value);
                }
            }
        }
    }
}

fn condition_holds(condition: &CompiledCondition, value: Option<&Value>) -> bool {
    let present = value.filter(|v| !v.is_null());
    match condition {
        CompiledCondition::Literal(expected) => equals(value, expected),
        CompiledCondition::Matches(pattern) => present.is_some_and(|v| pattern.is_match(&v.stringify())),
        CompiledCondition::Compare { op, operand } => match op {
            CompareOp::Equals => equals(value, operand),
            CompareOp::Contains => {
                present.is_some_and(|v| v.stringify().contains(operand.stringify().as_str()))
            }
            CompareOp::StartsWith => {
                present.is_some_and(|v| v.stringify().starts_with(operand.stringify().as_str()))
            }
            CompareOp::EndsWith => {
                present.is_some_and(|v| v.stringify().ends_with(operand.stringify().as_str()))
            }
            CompareOp::InList => operand.as_list().is_some_and(|items| {
                let v = value.unwrap_or(&Value::Null);
                items.iter().any(|item| item.loose_eq(v))
            }),
            CompareOp::GreaterThan => numeric_pair(value, operand).is_some_and(|(a, b)| a > b),
            CompareOp::LessThan => numeric_pair(value, operand).is_some_and(|(a, b)| a < b),
        },
    }
}

fn equals(value: Option<&Value>, expected: &Value) -> bool {
    match value {
        Some(v) => v.loose_eq(expected),
        None => expected.is_null(),
    }
}

fn numeric_pair(value: Option<&Value>, operand: &Value) -> Option<(f64, f64)> {
    Some((value?.as_f64()?, operand.as_f64()?))
}

#[derive(Debug, Default)]
struct RuleList {
    rules: Vec<Arc<Rule>>,
    sorted: bool,
}

/// An ordered collection of [`Rule`]s applied to records.
///
/// Rules are evaluated by priority, highest first; rules of equal priority
/// keep the order they were added in. The engine is `Send + Sync`: rules may
/// be added through a shared reference while other threads process records.
///
/// # Example
///
/// ```
/// use conventionalrp::{Action, Condition, Record, Rule, RuleEngine};
///
/// let engine = RuleEngine::new();
/// engine.add_rule(
///     Rule::builder("tag_dice")
///         .when("type", Condition::literal("dice_roll"))
///         .then(Action::add_tag("dice"))
///         .build()
///         .unwrap(),
/// );
///
/// let out = engine.process(&Record::new().set("type", "dice_roll"), false);
/// assert!(out.has_tag("dice"));
/// ```
#[derive(Debug, Default)]
pub struct RuleEngine {
    rules: RwLock<RuleList>,
}

impl RuleEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every rule from a parsed engine configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`]; no rule is added in that case.
    pub fn load_config(&self, config: EngineConfig) -> Result<usize, ConfigError> {
        let rules = config
            .rules
            .into_iter()
            .map(crate::compile::compile_rule_def)
            .collect::<Result<Vec<_>, _>>()?;
        let count = rules.len();
        self.add_rules(rules);
        Ok(count)
    }

    /// Parse an engine configuration document into a new engine.
    ///
    /// # Errors
    ///
    /// Returns [`ConventionalRpError`](crate::ConventionalRpError) on parse or
    /// configuration failure.
    pub fn from_config_str(input: &str) -> Result<Self, crate::ConventionalRpError> {
        let document = crate::parse::parse_document(input)?;
        let config = EngineConfig::from_json(document)?;
        let engine = Self::new();
        let count = engine.load_config(config)?;
        info!(rules = count, "loaded engine rules");
        Ok(engine)
    }

    /// Read an engine configuration file into a new engine.
    ///
    /// # Errors
    ///
    /// Returns [`ConventionalRpError`](crate::ConventionalRpError) on I/O,
    /// parse, or configuration failure.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::ConventionalRpError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_config_str(&input)
    }

    pub fn add_rule(&self, rule: Rule) {
        let mut list = self.write();
        list.rules.push(Arc::new(rule));
        list.sorted = false;
    }

    pub fn add_rules(&self, rules: impl IntoIterator<Item = Rule>) {
        let mut list = self.write();
        list.rules.extend(rules.into_iter().map(Arc::new));
        list.sorted = false;
    }

    pub fn clear(&self) {
        let mut list = self.write();
        list.rules.clear();
        list.sorted = true;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().rules.is_empty()
    }

    /// Rule names in evaluation order.
    #[must_use]
    pub fn rule_names(&self) -> Vec<String> {
        self.with_sorted(|rules| rules.iter().map(|r| r.name.clone()).collect())
    }

    /// Run the rules against a copy of `record`.
    ///
    /// With `apply_all` false, only the highest-priority matching rule is
    /// applied. With `apply_all` true, every rule is checked in order against
    /// the record as modified by the rules applied before it.
    #[must_use]
    pub fn process(&self, record: &Record, apply_all: bool) -> Record {
        self.with_sorted(|rules| run(rules, record, apply_all, |_| {}))
    }

    /// [`process()`](Self::process) each record independently.
    #[must_use]
    pub fn process_batch(&self, records: &[Record], apply_all: bool) -> Vec<Record> {
        self.with_sorted(|rules| {
            records
                .iter()
                .map(|record| run(rules, record, apply_all, |_| {}))
                .collect()
        })
    }

    /// Like [`process()`](Self::process), also reporting which rules fired.
    pub fn process_detailed(&self, record: &Record, apply_all: bool) -> ProcessReport {
        let start = Instant::now();
        let mut fired = Vec::new();
        let result = self.with_sorted(|rules| {
            run(rules, record, apply_all, |rule| fired.push(rule.name.clone()))
        });
        ProcessReport::new(result, fired, start.elapsed())
    }

    /// Every rule whose conditions hold for `record`, in evaluation order.
    /// Nothing is applied.
    #[must_use]
    pub fn find_matching_rules(&self, record: &Record) -> Vec<Arc<Rule>> {
        self.with_sorted(|rules| {
            rules
                .iter()
                .filter(|rule| rule.matches(record))
                .cloned()
                .collect()
        })
    }

    /// Call `f` with the rules in evaluation order, sorting first if a rule
    /// was added since the last sort.
    fn with_sorted<R>(&self, f: impl FnOnce(&[Arc<Rule>]) -> R) -> R {
        loop {
            {
                let list = self.read();
                if list.sorted {
                    return f(&list.rules);
                }
            }
            let mut list = self.write();
            if !list.sorted {
                list.rules.sort_by(|a, b| b.priority.cmp(&a.priority));
                list.sorted = true;
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RuleList> {
        self.rules.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RuleList> {
        self.rules.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn run(rules: &[Arc<Rule>], record: &Record, apply_all: bool, mut on_fire: impl FnMut(&Rule)) -> Record {
    let mut result = record.clone();
    for rule in rules {
        if !rule.matches(&result) {
            continue;
        }
        trace!(rule = rule.name.as_str(), priority = rule.priority, "rule fired");
        rule.apply_in_place(&mut result);
        on_fire(rule);
        if !apply_all {
            break;
        }
    }
    result
}

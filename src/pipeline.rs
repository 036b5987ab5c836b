//! Parse, flatten, process, hook: the end-to-end path from log text to records.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::engine::RuleEngine;
use crate::types::{Entry, Record, RuleSet, ValidationError};

/// A per-record step run after the rule engine, e.g. a plugin.
pub trait RecordHook: Send + Sync {
    fn name(&self) -> &str;

    fn process(&self, record: Record) -> Record;
}

struct FnHook<F> {
    name: String,
    f: F,
}

impl<F> RecordHook for FnHook<F>
where
    F: Fn(Record) -> Record + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, record: Record) -> Record {
        (self.f)(record)
    }
}

/// Wrap a closure as a [`RecordHook`].
pub fn hook_fn<F>(name: &str, f: F) -> impl RecordHook
where
    F: Fn(Record) -> Record + Send + Sync,
{
    FnHook {
        name: name.to_owned(),
        f,
    }
}

/// How parsed entries become records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Flatten {
    /// One record per segment, carrying its entry's metadata fields.
    #[default]
    Segments,
    /// One record per entry, with a nested `segments` list.
    Entries,
}

/// Builder for a [`Pipeline`]. A rule set is required; everything else is optional.
#[derive(Default)]
pub struct PipelineBuilder {
    ruleset: Option<Arc<RuleSet>>,
    engine: Option<Arc<RuleEngine>>,
    apply_all: bool,
    flatten: Flatten,
    hooks: Vec<Box<dyn RecordHook>>,
}

impl PipelineBuilder {
    #[must_use]
    pub fn ruleset(mut self, ruleset: impl Into<Arc<RuleSet>>) -> Self {
        self.ruleset = Some(ruleset.into());
        self
    }

    #[must_use]
    pub fn engine(mut self, engine: impl Into<Arc<RuleEngine>>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    /// Apply every matching engine rule instead of only the first. Off by default.
    #[must_use]
    pub fn apply_all(mut self, apply_all: bool) -> Self {
        self.apply_all = apply_all;
        self
    }

    #[must_use]
    pub fn flatten(mut self, flatten: Flatten) -> Self {
        self.flatten = flatten;
        self
    }

    /// Append a hook. Hooks run in the order they were added.
    #[must_use]
    pub fn hook(mut self, hook: impl RecordHook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// # Errors
    ///
    /// [`ValidationError::MissingRuleSet`] if no rule set was given.
    pub fn build(self) -> Result<Pipeline, ValidationError> {
        let ruleset = self.ruleset.ok_or(ValidationError::MissingRuleSet)?;
        Ok(Pipeline {
            ruleset,
            engine: self.engine,
            apply_all: self.apply_all,
            flatten: self.flatten,
            hooks: self.hooks,
        })
    }
}

/// Runs log text through a [`RuleSet`], an optional [`RuleEngine`] and a
/// chain of [`RecordHook`]s.
///
/// # Example
///
/// ```
/// use conventionalrp::{
///     Action, Condition, MatchDiscipline, Pipeline, Rule, RuleEngine, RuleSetBuilder,
/// };
///
/// let ruleset = RuleSetBuilder::new()
///     .metadata(|m| m.pattern(r"<(\w+)>").groups(["speaker"]))
///     .content("dice_roll", MatchDiscipline::Enclosed, |r| {
///         r.pattern(r"\[d(\d+)=(\d+)\]").groups(["dice", "result"])
///     })
///     .compile()
///     .unwrap();
///
/// let engine = RuleEngine::new();
/// engine.add_rule(
///     Rule::builder("high_roll")
///         .when("result", Condition::greater_than(15))
///         .then(Action::add_tag("high"))
///         .build()
///         .unwrap(),
/// );
///
/// let pipeline = Pipeline::builder().ruleset(ruleset).engine(engine).build().unwrap();
/// let records = pipeline.run_text("<dm>\nroll [d20=18]");
/// assert_eq!(records.len(), 2);
/// assert!(records[1].has_tag("high"));
/// ```
pub struct Pipeline {
    ruleset: Arc<RuleSet>,
    engine: Option<Arc<RuleEngine>>,
    apply_all: bool,
    flatten: Flatten,
    hooks: Vec<Box<dyn RecordHook>>,
}

impl Pipeline {
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    #[must_use]
    pub fn ruleset(&self) -> &Arc<RuleSet> {
        &self.ruleset
    }

    #[must_use]
    pub fn engine(&self) -> Option<&Arc<RuleEngine>> {
        self.engine.as_ref()
    }

    /// Hook names in execution order.
    #[must_use]
    pub fn hook_names(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    #[must_use]
    pub fn run_lines<I, S>(&self, lines: I) -> Vec<Record>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = self.ruleset.parse_file(lines);
        self.process_entries(&entries)
    }

    #[must_use]
    pub fn run_text(&self, text: &str) -> Vec<Record> {
        self.run_lines(text.lines())
    }

    /// Flatten already-parsed entries and process the resulting records.
    #[must_use]
    pub fn process_entries(&self, entries: &[Entry]) -> Vec<Record> {
        let records: Vec<Record> = match self.flatten {
            Flatten::Segments => entries.iter().flat_map(Entry::flatten).collect(),
            Flatten::Entries => entries.iter().map(Entry::to_record).collect(),
        };
        records
            .into_iter()
            .map(|record| self.process_record(record))
            .collect()
    }

    fn process_record(&self, record: Record) -> Record {
        let record = match &self.engine {
            Some(engine) => engine.process(&record, self.apply_all),
            None => record,
        };
        self.hooks.iter().fold(record, |record, hook| {
            trace!(hook = hook.name(), "running record hook");
            hook.process(record)
        })
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("ruleset", &self.ruleset.to_string())
            .field("engine_rules", &self.engine.as_ref().map(|e| e.len()))
            .field("apply_all", &self.apply_all)
            .field("flatten", &self.flatten)
            .field("hooks", &self.hook_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Action, Condition, MatchDiscipline, Rule, RuleSetBuilder, Value};

    fn ruleset() -> RuleSet {
        RuleSetBuilder::new()
            .metadata(|m| m.pattern(r"<(\w+)>").groups(["speaker"]))
            .content("dialogue", MatchDiscipline::Enclosed, |r| r.pattern("「(.+?)」").groups(["text"]))
            .compile()
            .unwrap()
    }

    #[test]
    fn build_requires_ruleset() {
        let err = Pipeline::builder().build().unwrap_err();
        assert_eq!(err, ValidationError::MissingRuleSet);
    }

    #[test]
    fn segments_flatten_without_engine() {
        let pipeline = Pipeline::builder().ruleset(ruleset()).build().unwrap();
        let records = pipeline.run_text("<dm>\n他说「你好」然后走了");
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].get("type"), Some(&Value::from("dialogue")));
        assert_eq!(records[1].get("text"), Some(&Value::from("你好")));
        assert!(records.iter().all(|r| r.get("speaker") == Some(&Value::from("dm"))));
    }

    #[test]
    fn entries_flatten() {
        let pipeline = Pipeline::builder()
            .ruleset(ruleset())
            .flatten(Flatten::Entries)
            .build()
            .unwrap();
        let records = pipeline.run_lines(["<a>", "x", "<b>"]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("type"), Some(&Value::from("entry")));
        assert_eq!(records[1].get("segments"), Some(&Value::List(vec![])));
    }

    #[test]
    fn engine_then_hooks_in_order() {
        let engine = RuleEngine::new();
        engine.add_rule(
            Rule::builder("tag_dialogue")
                .when("type", Condition::literal("dialogue"))
                .then(Action::add_tag("speech"))
                .build()
                .unwrap(),
        );
        let pipeline = Pipeline::builder()
            .ruleset(ruleset())
            .engine(engine)
            .hook(hook_fn("first", |r| r.set("order", "first")))
            .hook(hook_fn("second", |r| {
                let seen = r.get("order").map(Value::stringify).unwrap_or_default();
                r.set("order", format!("{seen},second"))
            }))
            .build()
            .unwrap();
        assert_eq!(pipeline.hook_names(), vec!["first", "second"]);

        let records = pipeline.run_text("<dm>\n「走」");
        assert_eq!(records.len(), 1);
        assert!(records[0].has_tag("speech"));
        assert_eq!(records[0].get("order"), Some(&Value::from("first,second")));
    }

    #[test]
    fn shared_engine_sees_later_rules() {
        let engine = Arc::new(RuleEngine::new());
        let pipeline = Pipeline::builder()
            .ruleset(ruleset())
            .engine(Arc::clone(&engine))
            .build()
            .unwrap();
        engine.add_rule(Rule::builder("all").then(Action::add_tag("seen")).build().unwrap());
        let records = pipeline.run_text("<dm>\nhi");
        assert!(records[0].has_tag("seen"));
        assert!(format!("{pipeline:?}").contains("engine_rules: Some(1)"));
    }
}

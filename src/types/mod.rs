mod action;
mod condition;
mod content_rule;
mod error;
mod pattern;
mod record;
mod report;
mod rule;
mod ruleset;
mod segment;
mod value;

pub use action::{Action, TransformError, TransformFn};
pub(crate) use condition::{CompareOp, CompiledCondition};
pub use condition::{Condition, ConditionOp};
pub use content_rule::{ContentRule, MatchDiscipline, MetadataRule, DEFAULT_PRIORITY};
pub use error::{ConfigError, ValidationError};
pub use pattern::{Pattern, PatternMatch};
pub use record::{Record, TAGS_FIELD};
pub use report::{ParseReport, ParseStats, ProcessReport};
pub use rule::{Rule, RuleBuilder};
pub use ruleset::{PatternRuleBuilder, RuleSet, RuleSetBuilder};
pub use segment::{Entry, Segment, ENTRY_TYPE, UNKNOWN};
pub use value::Value;

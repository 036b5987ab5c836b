//! Rule-driven parsing and processing of tabletop roleplay session logs.
//!
//! A [`RuleSet`] splits log lines into entries (one per metadata line) and
//! classifies content into typed [`Segment`]s. A [`RuleEngine`] then applies
//! condition/action [`Rule`]s to flat [`Record`]s. [`Pipeline`] ties the two
//! together with optional per-record hooks.

mod compile;
mod config;
mod engine;
mod error;
pub mod parse;
pub mod pipeline;
mod segment;
#[cfg(feature = "binary-cache")]
pub mod serial;
mod types;

pub use config::{ContentRuleDef, EngineConfig, MetadataRuleDef, ParserConfig, RuleDef};
pub use engine::RuleEngine;
pub use error::ConventionalRpError;
pub use pipeline::{hook_fn, Flatten, Pipeline, PipelineBuilder, RecordHook};
pub use types::{
    Action, Condition, ConditionOp, ConfigError, ContentRule, Entry, MatchDiscipline,
    MetadataRule, ParseReport, ParseStats, Pattern, PatternMatch, PatternRuleBuilder,
    ProcessReport, Record, Rule, RuleBuilder, RuleSet, RuleSetBuilder, Segment, TransformError,
    TransformFn, ValidationError, Value, DEFAULT_PRIORITY, ENTRY_TYPE, TAGS_FIELD, UNKNOWN,
};

#[cfg(feature = "binary-cache")]
pub use serial::{DeserializeError, SerializeError};

//! Rule definitions as they appear in configuration documents.
//!
//! Both document kinds are JSON with comments (see [`crate::parse`]). A parser
//! configuration holds `metadata` and `content` rule lists:
//!
//! ```text
//! {
//!   metadata: [{ patterns: ["^\\[(.+?)\\]\\s*<(.+?)>"], groups: ["timestamp", "speaker"] }],
//!   content: [
//!     { type: "dice_roll", match_type: "enclosed", patterns: ["\\[d(\\d+)=(\\d+)\\]"],
//!       groups: ["dice", "result"], priority: 90 },
//!   ],
//! }
//! ```
//!
//! A rule-engine configuration holds a `rules` list of
//! `{ name, priority, condition, action }` objects.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::{ConfigError, MatchDiscipline, DEFAULT_PRIORITY};

fn default_priority() -> i64 {
    DEFAULT_PRIORITY
}

/// A metadata rule before its patterns are compiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRuleDef {
    pub patterns: Vec<String>,
    #[serde(default, alias = "group_names")]
    pub groups: Vec<String>,
    #[serde(default = "default_priority")]
    pub priority: i64,
}

/// A content rule before its patterns are compiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRuleDef {
    #[serde(rename = "type")]
    pub segment_type: String,
    pub match_type: MatchDiscipline,
    pub patterns: Vec<String>,
    #[serde(default, alias = "group_names")]
    pub groups: Vec<String>,
    #[serde(default = "default_priority")]
    pub priority: i64,
}

/// Everything a [`RuleSet`](crate::RuleSet) is compiled from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParserConfig {
    pub metadata: Vec<MetadataRuleDef>,
    pub content: Vec<ContentRuleDef>,
}

impl ParserConfig {
    /// Read a parser configuration out of a parsed document.
    ///
    /// Missing `metadata` or `content` lists are treated as empty.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Malformed`] naming the offending rule when the document
    /// does not have the expected shape.
    pub fn from_json(document: serde_json::Value) -> Result<Self, ConfigError> {
        let mut root = into_object(document, "parser configuration")?;
        Ok(Self {
            metadata: items(root.remove("metadata"), "metadata rule")?,
            content: items(root.remove("content"), "content rule")?,
        })
    }
}

/// A generic rule before it is compiled. `condition` values and `action` stay
/// as raw JSON until compilation, which knows the rule name for error reporting.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RuleDef {
    pub name: String,
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default)]
    pub condition: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub action: Option<serde_json::Value>,
}

/// Everything a [`RuleEngine`](crate::RuleEngine) is loaded from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineConfig {
    pub rules: Vec<RuleDef>,
}

impl EngineConfig {
    /// # Errors
    ///
    /// [`ConfigError::Malformed`] when the document or one of its rules does
    /// not have the expected shape.
    pub fn from_json(document: serde_json::Value) -> Result<Self, ConfigError> {
        let mut root = into_object(document, "rule engine configuration")?;
        Ok(Self {
            rules: items(root.remove("rules"), "rule")?,
        })
    }
}

fn into_object(
    document: serde_json::Value,
    context: &str,
) -> Result<serde_json::Map<String, serde_json::Value>, ConfigError> {
    match document {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(ConfigError::Malformed {
            context: context.to_owned(),
            message: "expected an object at the top level".to_owned(),
        }),
    }
}

fn items<T: DeserializeOwned>(
    list: Option<serde_json::Value>,
    what: &str,
) -> Result<Vec<T>, ConfigError> {
    let list = match list {
        None | Some(serde_json::Value::Null) => return Ok(Vec::new()),
        Some(serde_json::Value::Array(list)) => list,
        Some(_) => {
            return Err(ConfigError::Malformed {
                context: format!("{what} list"),
                message: "expected an array".to_owned(),
            })
        }
    };
    list.into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item).map_err(|e| ConfigError::Malformed {
                context: format!("{what} #{i}"),
                message: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn content_rule_defaults() {
        let config = ParserConfig::from_json(json!({
            "content": [{"type": "dialogue", "match_type": "enclosed", "patterns": ["「(.+?)」"]}]
        }))
        .unwrap();
        assert!(config.metadata.is_empty());
        let rule = &config.content[0];
        assert_eq!(rule.segment_type, "dialogue");
        assert_eq!(rule.match_type, MatchDiscipline::Enclosed);
        assert!(rule.groups.is_empty());
        assert_eq!(rule.priority, DEFAULT_PRIORITY);
    }

    #[test]
    fn group_names_alias() {
        let config = ParserConfig::from_json(json!({
            "metadata": [{"type": "ignored", "patterns": ["x"], "group_names": ["speaker"], "priority": 3}]
        }))
        .unwrap();
        assert_eq!(config.metadata[0].groups, vec!["speaker"]);
        assert_eq!(config.metadata[0].priority, 3);
    }

    #[test]
    fn missing_match_type_names_the_rule() {
        let err = ParserConfig::from_json(json!({
            "content": [
                {"type": "a", "match_type": "prefix", "patterns": ["a"]},
                {"type": "b", "patterns": ["b"]}
            ]
        }))
        .unwrap_err();
        match err {
            ConfigError::Malformed { context, message } => {
                assert_eq!(context, "content rule #1");
                assert!(message.contains("match_type"), "{message}");
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn unknown_match_type_rejected() {
        let err = ParserConfig::from_json(json!({
            "content": [{"type": "a", "match_type": "infix", "patterns": ["a"]}]
        }))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn top_level_must_be_object() {
        let err = ParserConfig::from_json(json!([1, 2])).unwrap_err();
        assert!(
            matches!(err, ConfigError::Malformed { context, .. } if context == "parser configuration")
        );
        assert!(EngineConfig::from_json(json!("rules")).is_err());
    }

    #[test]
    fn list_must_be_array() {
        let err = ParserConfig::from_json(json!({"content": {"type": "x"}})).unwrap_err();
        assert!(
            matches!(err, ConfigError::Malformed { context, .. } if context == "content rule list")
        );
    }

    #[test]
    fn engine_rule_defaults() {
        let config = EngineConfig::from_json(json!({
            "rules": [{"name": "tag", "action": {"type": "add_tag", "tag": "x"}}]
        }))
        .unwrap();
        let rule = &config.rules[0];
        assert_eq!(rule.priority, DEFAULT_PRIORITY);
        assert!(rule.condition.is_empty());
        assert!(rule.action.is_some());
    }

    #[test]
    fn engine_rule_requires_name() {
        let err = EngineConfig::from_json(json!({"rules": [{"priority": 1}]})).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { context, .. } if context == "rule #0"));
    }
}

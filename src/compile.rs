use tracing::debug;

use crate::config::{ContentRuleDef, MetadataRuleDef, ParserConfig, RuleDef};
use crate::types::{
    Action, CompareOp, CompiledCondition, Condition, ConditionOp, ConfigError, ContentRule,
    MatchDiscipline, MetadataRule, Pattern, Rule, RuleBuilder, RuleSet, Value,
};

pub(crate) fn compile_ruleset(config: &ParserConfig) -> Result<RuleSet, ConfigError> {
    let metadata_rules = config
        .metadata
        .iter()
        .enumerate()
        .map(|(i, def)| compile_metadata_rule(i, def))
        .collect::<Result<Vec<_>, _>>()?;

    let mut content_rules = config
        .content
        .iter()
        .enumerate()
        .map(|(i, def)| compile_content_rule(i, def))
        .collect::<Result<Vec<_>, _>>()?;

    // Stable: equal priorities keep declaration order.
    content_rules.sort_by(|a, b| b.priority.cmp(&a.priority));

    Ok(RuleSet {
        metadata_rules,
        content_rules,
    })
}

fn compile_metadata_rule(index: usize, def: &MetadataRuleDef) -> Result<MetadataRule, ConfigError> {
    let name = format!("metadata[{index}]");
    let patterns = compile_patterns(&name, &def.patterns, Pattern::anchored)?;
    Ok(MetadataRule {
        patterns,
        group_names: def.groups.clone(),
        priority: def.priority,
    })
}

fn compile_content_rule(index: usize, def: &ContentRuleDef) -> Result<ContentRule, ConfigError> {
    if def.segment_type.is_empty() {
        return Err(ConfigError::Malformed {
            context: format!("content rule #{index}"),
            message: "`type` must not be empty".to_owned(),
        });
    }
    let patterns = compile_patterns(&def.segment_type, &def.patterns, Pattern::new)?;

    if def.match_type != MatchDiscipline::Prefix {
        if let Some(p) = patterns.iter().find(|p| p.is_match("")) {
            return Err(ConfigError::ZeroWidthPattern {
                rule: def.segment_type.clone(),
                pattern: p.as_str().to_owned(),
            });
        }
    }

    Ok(ContentRule {
        segment_type: def.segment_type.clone(),
        discipline: def.match_type,
        patterns,
        group_names: def.groups.clone(),
        priority: def.priority,
    })
}

fn compile_patterns(
    rule: &str,
    sources: &[String],
    compile: fn(&str) -> Result<Pattern, regex::Error>,
) -> Result<Vec<Pattern>, ConfigError> {
    if sources.is_empty() {
        return Err(ConfigError::NoPatterns {
            rule: rule.to_owned(),
        });
    }
    sources
        .iter()
        .map(|src| {
            compile(src).map_err(|source| ConfigError::InvalidPattern {
                rule: rule.to_owned(),
                pattern: src.clone(),
                source,
            })
        })
        .collect()
}

pub(crate) fn compile_rule(builder: RuleBuilder) -> Result<Rule, ConfigError> {
    let RuleBuilder {
        name,
        priority,
        conditions,
        action,
    } = builder;

    let Some(action) = action else {
        return Err(ConfigError::MissingAction { rule: name });
    };

    let conditions = conditions
        .into_iter()
        .map(|(field, condition)| {
            let compiled = compile_condition(&name, &field, condition)?;
            Ok((field, compiled))
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    Ok(Rule {
        name,
        priority,
        conditions,
        action,
    })
}

fn compile_condition(
    rule: &str,
    field: &str,
    condition: Condition,
) -> Result<CompiledCondition, ConfigError> {
    match condition {
        Condition::Literal(value) => Ok(CompiledCondition::Literal(value)),
        Condition::Op { op, operand } => match CompareOp::from_op(op) {
            Some(op) => Ok(CompiledCondition::Compare { op, operand }),
            None => compile_matches(rule, field, &operand).map(CompiledCondition::Matches),
        },
    }
}

fn compile_matches(rule: &str, field: &str, operand: &Value) -> Result<Pattern, ConfigError> {
    let Some(src) = operand.as_str() else {
        return Err(missing_operand(rule, field, ConditionOp::Matches));
    };
    Pattern::new(src).map_err(|source| ConfigError::InvalidPattern {
        rule: rule.to_owned(),
        pattern: src.to_owned(),
        source,
    })
}

fn missing_operand(rule: &str, field: &str, op: ConditionOp) -> ConfigError {
    ConfigError::MissingOperand {
        rule: rule.to_owned(),
        field: field.to_owned(),
        operator: op.as_str().to_owned(),
    }
}

pub(crate) fn compile_rule_def(def: RuleDef) -> Result<Rule, ConfigError> {
    let RuleDef {
        name,
        priority,
        condition,
        action,
    } = def;

    let Some(action) = action else {
        return Err(ConfigError::MissingAction { rule: name });
    };
    let action: Action = serde_json::from_value(action).map_err(|e| ConfigError::Malformed {
        context: format!("action of rule '{name}'"),
        message: e.to_string(),
    })?;

    let mut builder = Rule::builder(&name).priority(priority).then(action);
    for (field, json) in condition {
        let condition = condition_from_json(&name, &field, json)?;
        builder = builder.when(&field, condition);
    }
    let rule = builder.build()?;
    debug!(rule = %rule, "compiled rule");
    Ok(rule)
}

/// An object with a string `type` is a structured condition; anything else is a literal.
fn condition_from_json(
    rule: &str,
    field: &str,
    json: serde_json::Value,
) -> Result<Condition, ConfigError> {
    let mut map = match json {
        serde_json::Value::Object(map) if map.get("type").is_some_and(|t| t.is_string()) => map,
        other => return Ok(Condition::Literal(Value::from(other))),
    };

    let name = map
        .get("type")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let op: ConditionOp = name.parse().map_err(|()| ConfigError::UnknownOperator {
        rule: rule.to_owned(),
        field: field.to_owned(),
        operator: name.clone(),
    })?;

    let operand = match op {
        ConditionOp::Matches => map.remove("pattern").or_else(|| map.remove("value")),
        _ => map.remove("value"),
    };
    match (op, operand) {
        (_, Some(operand)) if !operand.is_null() => Ok(Condition::op(op, Value::from(operand))),
        (ConditionOp::Equals, _) => Ok(Condition::op(op, Value::Null)),
        _ => Err(missing_operand(rule, field, op)),
    }
}

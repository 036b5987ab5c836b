//! Parse a session log, then enrich every segment with rule-engine rules and
//! a custom hook. Prints the resulting records as JSON lines.
//!
//! Run with: `cargo run --example rule_system`

use conventionalrp::{
    hook_fn, Action, Condition, ConventionalRpError, Pipeline, Rule, RuleEngine, RuleSet, Value,
};
use tracing_subscriber::EnvFilter;

const RULES: &str = include_str!("data/session_rules.json5");
const ENGINE_RULES: &str = include_str!("data/engine_rules.json5");
const LOG: &str = include_str!("data/session.log");

fn main() -> Result<(), ConventionalRpError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let ruleset = RuleSet::from_config_str(RULES)?;
    let engine = RuleEngine::from_config_str(ENGINE_RULES)?;

    // Rules can also be built in code and mixed with loaded ones.
    engine.add_rule(
        Rule::builder("out_of_character")
            .priority(95)
            .when("type", Condition::literal("ooc"))
            .then(Action::add_tag("ooc"))
            .build()?,
    );
    println!("engine rules, in evaluation order:");
    for name in engine.rule_names() {
        println!("  {name}");
    }

    let pipeline = Pipeline::builder()
        .ruleset(ruleset)
        .engine(engine)
        .apply_all(true)
        .hook(hook_fn("drop_empty_modifier", |mut record| {
            if record.get("modifier") == Some(&Value::from("")) {
                record.remove("modifier");
            }
            record
        }))
        .build()?;

    println!();
    for record in pipeline.run_text(LOG) {
        println!("{}", record.to_json());
    }
    Ok(())
}

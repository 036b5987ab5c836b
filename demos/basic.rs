//! Parse a session log and print its entries.
//!
//! Run with: `cargo run --example basic`
//! Set `RUST_LOG=conventionalrp=debug` to see rule loading and dropped lines.

use conventionalrp::{ConventionalRpError, RuleSet};
use tracing_subscriber::EnvFilter;

const RULES: &str = include_str!("data/session_rules.json5");
const LOG: &str = include_str!("data/session.log");

fn main() -> Result<(), ConventionalRpError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let ruleset = RuleSet::from_config_str(RULES)?;
    println!("{ruleset}");

    let report = ruleset.parse_report(LOG.lines());
    for entry in report.entries() {
        println!(
            "\n[{}] {}",
            entry.meta("timestamp").unwrap_or("?"),
            entry.meta("speaker").unwrap_or("?")
        );
        for segment in entry.segments() {
            print!("  {:<10} {}", segment.segment_type(), segment.content());
            if !segment.fields().is_empty() {
                let fields: Vec<String> = segment
                    .fields()
                    .iter()
                    .filter(|(_, v)| !v.is_empty())
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect();
                print!("  ({})", fields.join(", "));
            }
            println!();
        }
    }

    println!("\n{report}");
    Ok(())
}

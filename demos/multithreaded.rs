//! Share one rule set and one engine across worker threads, each parsing and
//! processing its own copy of the session log.
//!
//! Run with: `cargo run --example multithreaded`

use std::sync::Arc;
use std::thread;

use conventionalrp::{ConventionalRpError, Record, RuleEngine, RuleSet};
use tracing_subscriber::EnvFilter;

const RULES: &str = include_str!("data/session_rules.json5");
const ENGINE_RULES: &str = include_str!("data/engine_rules.json5");
const LOG: &str = include_str!("data/session.log");

const WORKERS: usize = 4;

fn main() -> Result<(), ConventionalRpError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let ruleset = Arc::new(RuleSet::from_config_str(RULES)?);
    let engine = Arc::new(RuleEngine::from_config_str(ENGINE_RULES)?);

    let handles: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let ruleset = Arc::clone(&ruleset);
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let records: Vec<Record> = ruleset
                    .parse_text(LOG)
                    .iter()
                    .flat_map(|entry| entry.flatten())
                    .collect();
                let processed = engine.process_batch(&records, true);
                let tagged = processed.iter().filter(|r| !r.tags().is_empty()).count();
                (worker, processed.len(), tagged)
            })
        })
        .collect();

    for handle in handles {
        match handle.join() {
            Ok((worker, records, tagged)) => {
                println!("worker {worker}: {records} records, {tagged} tagged");
            }
            Err(_) => eprintln!("worker panicked"),
        }
    }
    Ok(())
}

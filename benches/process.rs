use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use conventionalrp::{Action, Condition, Record, Rule, RuleEngine, RuleSet};

const RULES: &str = include_str!("../demos/data/session_rules.json5");
const ENGINE_RULES: &str = include_str!("../demos/data/engine_rules.json5");
const LOG: &str = include_str!("../demos/data/session.log");

/// An engine with `n` rules, none of which match, plus one catch-all at the bottom.
fn build_engine(n: usize) -> RuleEngine {
    let engine = RuleEngine::new();
    for i in 0..n {
        engine.add_rule(
            Rule::builder(&format!("r{i}"))
                .priority(100)
                .when("type", Condition::literal(format!("never_{i}")))
                .then(Action::add_tag("never"))
                .build()
                .unwrap(),
        );
    }
    engine.add_rule(
        Rule::builder("catch_all")
            .priority(0)
            .then(Action::add_tag("seen"))
            .build()
            .unwrap(),
    );
    engine
}

fn session_records() -> Vec<Record> {
    RuleSet::from_config_str(RULES)
        .unwrap()
        .parse_text(LOG)
        .iter()
        .flat_map(|entry| entry.flatten())
        .collect()
}

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("process");
    let record = Record::new().set("type", "dice_roll").set("result", "18");

    for &n in &[5, 20, 50] {
        let engine = build_engine(n);
        group.bench_function(format!("{n}_rules_first_match"), |b| {
            b.iter(|| engine.process(black_box(&record), false));
        });
        group.bench_function(format!("{n}_rules_apply_all"), |b| {
            b.iter(|| engine.process(black_box(&record), true));
        });
    }

    group.finish();
}

fn bench_session_batch(c: &mut Criterion) {
    let engine = RuleEngine::from_config_str(ENGINE_RULES).unwrap();
    let records = session_records();

    c.bench_function("session_batch_apply_all", |b| {
        b.iter(|| engine.process_batch(black_box(&records), true));
    });
}

fn bench_throughput(c: &mut Criterion) {
    let thread_counts = [1, 2, 4, 8];

    let mut group = c.benchmark_group("throughput");
    group.measurement_time(Duration::from_secs(5));

    let engine = Arc::new(RuleEngine::from_config_str(ENGINE_RULES).unwrap());
    let records = Arc::new(session_records());

    for &threads in &thread_counts {
        group.bench_function(format!("{threads}_threads"), |b| {
            b.iter_custom(|iters| {
                let per_thread = iters / threads as u64;
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let engine = Arc::clone(&engine);
                        let records = Arc::clone(&records);
                        thread::spawn(move || {
                            let start = Instant::now();
                            for _ in 0..per_thread {
                                let _ = engine.process_batch(&records, true);
                            }
                            start.elapsed()
                        })
                    })
                    .collect();

                let mut max_elapsed = Duration::ZERO;
                for h in handles {
                    let elapsed = h.join().unwrap();
                    if elapsed > max_elapsed {
                        max_elapsed = elapsed;
                    }
                }
                max_elapsed
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_process, bench_session_batch, bench_throughput);
criterion_main!(benches);

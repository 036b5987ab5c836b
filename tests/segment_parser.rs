use conventionalrp::{MatchDiscipline, RuleSet, RuleSetBuilder, Segment, Value};

const SESSION_RULES: &str = r#"
// Session log rules
{
  metadata: [
    { patterns: ['\\[(.+?)\\]\\s*<(.+?)>'], groups: ['timestamp', 'speaker'] },
  ],
  content: [
    { type: 'dice_roll', match_type: 'enclosed', priority: 90,
      patterns: ['\\[d(\\d+)=(\\d+)\\]'], groups: ['dice', 'result'] },
    { type: 'ooc', match_type: 'prefix', priority: 80, patterns: ['\\(\\('] },
    { type: 'dialogue', match_type: 'enclosed', priority: 60,
      patterns: ['「(.+?)」', '"(.+?)"'], groups: ['text'] },
    { type: 'action', match_type: 'enclosed', priority: 40,
      patterns: ['\\*(.+?)\\*'], groups: ['verb'] },
  ],
}
"#;

fn session() -> RuleSet {
    RuleSet::from_config_str(SESSION_RULES).unwrap()
}

fn describe(segments: &[Segment]) -> Vec<(&str, &str)> {
    segments
        .iter()
        .map(|s| (s.segment_type(), s.content()))
        .collect()
}

#[test]
fn parses_mixed_session_log() {
    let log = "\
[2025-10-24 14:30:01] <艾莉娅>
*推开门* 「有人吗？」
[d20=17]

[2025-10-24 14:30:15] <DM>
(( 休息五分钟 ))
";
    let entries = session().parse_text(log);
    assert_eq!(entries.len(), 2);

    let first = &entries[0];
    assert_eq!(first.meta("speaker"), Some("艾莉娅"));
    assert_eq!(first.meta("timestamp"), Some("2025-10-24 14:30:01"));
    assert_eq!(
        describe(first.segments()),
        vec![
            ("action", "*推开门*"),
            ("dialogue", "「有人吗？」"),
            ("dice_roll", "[d20=17]"),
        ]
    );
    assert_eq!(first.segments()[1].field("text"), Some("有人吗？"));
    assert_eq!(first.segments()[2].field("result"), Some("17"));

    let second = &entries[1];
    assert_eq!(second.meta("speaker"), Some("DM"));
    assert_eq!(describe(second.segments()), vec![("ooc", "(( 休息五分钟 ))")]);
}

#[test]
fn second_pattern_of_a_rule_is_tried() {
    let segments = session().parse(r#"she says "hello" twice"#);
    assert_eq!(
        describe(&segments),
        vec![
            ("unknown", "she says"),
            ("dialogue", "\"hello\""),
            ("unknown", "twice"),
        ]
    );
}

#[test]
fn higher_priority_rule_claims_text_first() {
    // The dice roll sits inside the dialogue, but dice_roll outranks dialogue.
    let segments = session().parse("「掷骰 [d6=4] 吧」");
    assert_eq!(
        describe(&segments),
        vec![("unknown", "「掷骰"), ("dice_roll", "[d6=4]"), ("unknown", "吧」")]
    );
}

#[test]
fn segments_of_filters_by_type() {
    let entries = session().parse_text("[t] <a>\n[d6=1] and [d8=2] *nods*");
    let rolls: Vec<&str> = entries[0]
        .segments_of("dice_roll")
        .map(|s| s.field("dice").unwrap_or_default())
        .collect();
    assert_eq!(rolls, vec!["6", "8"]);
}

#[test]
fn no_metadata_rules_drops_every_line() {
    let ruleset = RuleSetBuilder::new()
        .content("word", MatchDiscipline::Enclosed, |r| r.pattern(r"\w+"))
        .compile()
        .unwrap();
    let report = ruleset.parse_report(["a", "b", ""]);
    assert!(report.entries().is_empty());
    assert_eq!(report.stats().dropped_lines, 2);
    assert_eq!(report.stats().blank_lines, 1);
}

#[test]
fn metadata_only_entries_have_no_segments() {
    let entries = session().parse_file(["[1] <a>", "[2] <b>"]);
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.segments().is_empty()));
}

#[test]
fn parse_report_counts_segment_types() {
    let report = session().parse_report(["[1] <a>", "[d6=1] [d6=2] 「hi」", "plain"]);
    let stats = report.stats();
    assert_eq!(stats.total_lines, 3);
    assert_eq!(stats.metadata_lines, 1);
    assert_eq!(stats.content_lines, 2);
    assert_eq!(stats.count_of("dice_roll"), 2);
    assert_eq!(stats.count_of("dialogue"), 1);
    assert_eq!(stats.count_of("unknown"), 1);
    assert_eq!(stats.count_of("ooc"), 0);
    assert_eq!(stats.segments(), 4);
    assert!(report.to_string().contains("entries: 1"), "{report}");
}

#[test]
fn entry_flatten_carries_metadata() {
    let entries = session().parse_text("[09:00] <DM>\n[d20=5] 「run」");
    let records = entries[0].flatten();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("type"), Some(&Value::from("dice_roll")));
    assert_eq!(records[0].get("result"), Some(&Value::from("5")));
    assert_eq!(records[0].get("speaker"), Some(&Value::from("DM")));
    assert_eq!(records[1].get("content"), Some(&Value::from("「run」")));
    assert_eq!(records[1].get("timestamp"), Some(&Value::from("09:00")));
}

#[test]
fn segment_field_wins_over_metadata_in_flatten() {
    let ruleset = RuleSetBuilder::new()
        .metadata(|m| m.pattern(r"<(\w+)>").groups(["speaker"]))
        .content("quote", MatchDiscipline::Enclosed, |r| {
            r.pattern(r"(\w+): '(.+?)'").groups(["speaker", "text"])
        })
        .compile()
        .unwrap();
    let entries = ruleset.parse_text("<narrator>\nbob: 'hi'");
    let records = entries[0].flatten();
    assert_eq!(records[0].get("speaker"), Some(&Value::from("bob")));
}

#[test]
fn entry_to_record_nests_segments() {
    let entries = session().parse_text("[1] <a>\n[d4=2]");
    let record = entries[0].to_record();
    assert_eq!(record.get("type"), Some(&Value::from("entry")));
    assert_eq!(record.get("speaker"), Some(&Value::from("a")));
    let Some(Value::List(segments)) = record.get("segments") else {
        panic!("segments should be a list: {record:?}");
    };
    assert_eq!(segments.len(), 1);
    let Value::Map(first) = &segments[0] else {
        panic!("segment should be a map");
    };
    assert_eq!(first.get("type"), Some(&Value::from("dice_roll")));
}

#[test]
fn entries_serialize_to_json() {
    let entries = session().parse_text("[1] <a>\n「hi」");
    let json = serde_json::to_value(&entries).unwrap();
    assert_eq!(json[0]["metadata"]["speaker"], "a");
    assert_eq!(json[0]["segments"][0]["type"], "dialogue");
    assert_eq!(json[0]["segments"][0]["fields"]["text"], "hi");
}

#[test]
fn crlf_lines_are_handled() {
    let entries = session().parse_text("[1] <a>\r\n「hi」\r\n");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].segments()[0].segment_type(), "dialogue");
}

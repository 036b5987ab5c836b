#![cfg(feature = "binary-cache")]

use conventionalrp::serial::cache_matches_source;
use conventionalrp::{DeserializeError, MatchDiscipline, RuleSet, RuleSetBuilder};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const SOURCE: &str = r#"{
  metadata: [ { patterns: ['\\[(.+?)\\]\\s*<(.+?)>'], groups: ['timestamp', 'speaker'] } ],
  content: [
    { type: 'dialogue', match_type: 'enclosed', patterns: ['「(.+?)」'], groups: ['text'], priority: 60 },
    { type: 'dice_roll', match_type: 'enclosed', patterns: ['\\[d(\\d+)=(\\d+)\\]'],
      groups: ['dice', 'result'], priority: 90 },
    { type: 'ooc', match_type: 'prefix', patterns: ['\\(\\(', '//'], priority: 80 },
    { type: 'aside', match_type: 'suffix', patterns: ['\\.\\.\\.'], priority: 10 },
  ],
}"#;

const LOG: &str = "\
[14:30] <艾莉娅>
「等等」 [d20=18] 他犹豫了... 然后
(( brb
[14:31] <DM>
// 私聊
";

fn session_ruleset() -> RuleSet {
    RuleSet::from_config_str(SOURCE).unwrap()
}

fn simple_ruleset() -> RuleSet {
    RuleSetBuilder::new()
        .metadata(|m| m.pattern(r"<(\w+)>").groups(["speaker"]))
        .content("dice_roll", MatchDiscipline::Enclosed, |r| {
            r.pattern(r"\[d(\d+)=(\d+)\]").groups(["dice", "result"])
        })
        .compile()
        .unwrap()
}

fn assert_same_behavior(original: &RuleSet, restored: &RuleSet) {
    assert_eq!(original.to_config(), restored.to_config());
    assert_eq!(original.parse_text(LOG), restored.parse_text(LOG));
}

// ---------------------------------------------------------------------------
// Round-trips
// ---------------------------------------------------------------------------

#[test]
fn round_trip_simple() {
    let original = simple_ruleset();
    let bytes = original.to_bytes(None).unwrap();
    assert_eq!(&bytes[0..4], b"CRPS");
    let restored = RuleSet::from_bytes(&bytes).unwrap();
    assert_same_behavior(&original, &restored);
}

#[test]
fn round_trip_every_discipline() {
    let original = session_ruleset();
    let restored = RuleSet::from_bytes(&original.to_bytes(None).unwrap()).unwrap();
    assert_same_behavior(&original, &restored);

    let entries = restored.parse_text(LOG);
    let kinds: Vec<&str> = entries[0]
        .segments()
        .iter()
        .map(|s| s.segment_type())
        .collect();
    assert_eq!(kinds, vec!["dialogue", "dice_roll", "aside", "unknown", "ooc"]);
    assert_eq!(entries[1].segments()[0].segment_type(), "ooc");
}

#[test]
fn round_trip_keeps_priority_order() {
    let restored = RuleSet::from_bytes(&session_ruleset().to_bytes(None).unwrap()).unwrap();
    let order: Vec<&str> = restored
        .content_rules()
        .iter()
        .map(|r| r.segment_type())
        .collect();
    assert_eq!(order, vec!["dice_roll", "ooc", "dialogue", "aside"]);
}

#[test]
fn empty_ruleset_round_trip() {
    let original = RuleSetBuilder::new().compile().unwrap();
    let restored = RuleSet::from_bytes(&original.to_bytes(None).unwrap()).unwrap();
    assert!(restored.metadata_rules().is_empty());
    assert!(restored.content_rules().is_empty());
}

// ---------------------------------------------------------------------------
// Source digest
// ---------------------------------------------------------------------------

#[test]
fn source_digest_detects_changes() {
    let bytes = session_ruleset().to_bytes(Some(SOURCE)).unwrap();
    assert!(cache_matches_source(&bytes, SOURCE).unwrap());
    assert!(!cache_matches_source(&bytes, &format!("{SOURCE}\n// edited")).unwrap());

    let undigested = session_ruleset().to_bytes(None).unwrap();
    assert!(!cache_matches_source(&undigested, SOURCE).unwrap());
}

// ---------------------------------------------------------------------------
// Corruption
// ---------------------------------------------------------------------------

#[test]
fn corruption_byte_flip() {
    let mut corrupted = simple_ruleset().to_bytes(None).unwrap();
    let last = corrupted.len() - 1;
    corrupted[last] ^= 0xFF;

    let err = RuleSet::from_bytes(&corrupted).unwrap_err();
    assert!(
        matches!(err, DeserializeError::ChecksumMismatch),
        "expected ChecksumMismatch, got: {err}"
    );
}

#[test]
fn corruption_truncation() {
    let bytes = simple_ruleset().to_bytes(None).unwrap();
    let err = RuleSet::from_bytes(&bytes[..33]).unwrap_err();
    assert!(
        matches!(err, DeserializeError::LengthMismatch { .. }),
        "expected LengthMismatch, got: {err}"
    );
}

#[test]
fn bad_magic() {
    let mut bad = simple_ruleset().to_bytes(None).unwrap();
    bad[0..4].copy_from_slice(b"BAAD");
    let err = RuleSet::from_bytes(&bad).unwrap_err();
    assert!(matches!(err, DeserializeError::BadMagic), "expected BadMagic, got: {err}");
}

#[test]
fn version_mismatch() {
    let mut bad = simple_ruleset().to_bytes(None).unwrap();
    bad[4] = 99;
    bad[5] = 0;
    let err = RuleSet::from_bytes(&bad).unwrap_err();
    assert!(
        matches!(
            err,
            DeserializeError::IncompatibleVersion {
                blob: 99,
                supported: 1
            }
        ),
        "expected IncompatibleVersion, got: {err}"
    );
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

#[test]
fn file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.crps");

    let original = session_ruleset();
    original.to_binary_file(&path, Some(SOURCE)).unwrap();
    let restored = RuleSet::from_binary_file(&path).unwrap();
    assert_same_behavior(&original, &restored);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = RuleSet::from_binary_file(dir.path().join("absent.crps")).unwrap_err();
    assert!(matches!(err, DeserializeError::Io(_)), "expected Io, got: {err}");
}

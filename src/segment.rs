use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::types::{
    ContentRule, Entry, MatchDiscipline, MetadataRule, ParseStats, PatternMatch, RuleSet, Segment,
};

/// Segment one line. Whitespace-only lines produce nothing; an unmatched
/// line comes back verbatim as a single `unknown` segment.
pub(crate) fn segment_line(rules: &[ContentRule], line: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    if !line.trim().is_empty() {
        segment_into(rules, line, &mut out);
    }
    out
}

/// Recursive content segmentation.
///
/// Every branch that continues works on a strictly shorter slice: match spans
/// are non-empty, and zero-width matches end segmentation of the slice.
fn segment_into(rules: &[ContentRule], mut text: &str, out: &mut Vec<Segment>) {
    while !text.is_empty() {
        let Some((rule, m)) = first_match(rules, text) else {
            out.push(Segment::unknown(text));
            return;
        };
        let (start, end) = (m.start(), m.end());

        if start == end && (rule.discipline != MatchDiscipline::Prefix || start == text.len()) {
            debug!(
                rule = rule.segment_type.as_str(),
                offset = start,
                "zero-width match, leaving text unclassified"
            );
            out.push(Segment::unknown(text));
            return;
        }

        let fields = m.fields(&rule.group_names);
        match rule.discipline {
            MatchDiscipline::Enclosed => {
                segment_piece(rules, &text[..start], out);
                out.push(Segment::new(
                    rule.segment_type.as_str(),
                    &text[start..end],
                    fields,
                ));
                text = text[end..].trim();
            }
            MatchDiscipline::Prefix => {
                segment_piece(rules, &text[..start], out);
                out.push(Segment::new(rule.segment_type.as_str(), &text[start..], fields));
                return;
            }
            MatchDiscipline::Suffix => {
                out.push(Segment::new(rule.segment_type.as_str(), &text[..end], fields));
                text = text[end..].trim();
            }
        }
    }
}

fn segment_piece(rules: &[ContentRule], piece: &str, out: &mut Vec<Segment>) {
    let piece = piece.trim();
    if !piece.is_empty() {
        segment_into(rules, piece, out);
    }
}

/// First (rule, pattern) in evaluation order with a match anywhere in `text`.
/// Priority decides, not match position.
fn first_match<'r, 't>(
    rules: &'r [ContentRule],
    text: &'t str,
) -> Option<(&'r ContentRule, PatternMatch<'t>)> {
    rules.iter().find_map(|rule| {
        rule.patterns
            .iter()
            .find_map(|pattern| pattern.find(text))
            .map(|m| (rule, m))
    })
}

/// Fields of the first metadata rule matching at the start of `line`.
pub(crate) fn match_metadata(
    rules: &[MetadataRule],
    line: &str,
) -> Option<BTreeMap<String, String>> {
    rules.iter().find_map(|rule| {
        rule.patterns
            .iter()
            .find_map(|pattern| pattern.find(line))
            .map(|m| m.fields(&rule.group_names))
    })
}

pub(crate) fn parse_lines<I, S>(ruleset: &RuleSet, lines: I) -> (Vec<Entry>, ParseStats)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut entries = Vec::new();
    let mut stats = ParseStats::default();
    let mut current: Option<Entry> = None;

    for line in lines {
        let line = line.as_ref();
        stats.total_lines += 1;

        if line.trim().is_empty() {
            stats.blank_lines += 1;
            continue;
        }

        if let Some(metadata) = match_metadata(&ruleset.metadata_rules, line) {
            stats.metadata_lines += 1;
            if let Some(done) = current.replace(Entry::new(metadata)) {
                trace!(line = stats.total_lines, segments = done.segments().len(), "entry flushed");
                entries.push(done);
            }
            continue;
        }

        let Some(entry) = current.as_mut() else {
            stats.dropped_lines += 1;
            debug!(line = stats.total_lines, "content line before first metadata line dropped");
            continue;
        };

        stats.content_lines += 1;
        let segments = segment_line(&ruleset.content_rules, line);
        for segment in &segments {
            *stats
                .segment_types
                .entry(segment.segment_type().to_owned())
                .or_default() += 1;
        }
        entry.extend(segments);
    }

    if let Some(done) = current {
        trace!(line = stats.total_lines, segments = done.segments().len(), "entry flushed");
        entries.push(done);
    }

    (entries, stats)
}

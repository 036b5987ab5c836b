use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Serialize;

use super::record::Record;
use super::segment::Entry;

/// Line and segment counts gathered while parsing a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    /// Every physical line seen.
    pub total_lines: usize,
    /// Lines that opened a new entry.
    pub metadata_lines: usize,
    /// Non-blank lines segmented into an open entry.
    pub content_lines: usize,
    /// Empty or whitespace-only lines.
    pub blank_lines: usize,
    /// Content lines seen before any metadata line; they belong to no entry.
    pub dropped_lines: usize,
    /// Number of segments produced, per segment type.
    pub segment_types: BTreeMap<String, usize>,
}

impl ParseStats {
    /// Total number of segments across all types.
    #[must_use]
    pub fn segments(&self) -> usize {
        self.segment_types.values().sum()
    }

    #[must_use]
    pub fn count_of(&self, segment_type: &str) -> usize {
        self.segment_types.get(segment_type).copied().unwrap_or(0)
    }
}

/// Result of [`RuleSet::parse_report()`](crate::RuleSet::parse_report):
/// the entries, line statistics and wall-clock duration.
#[derive(Debug, Clone)]
#[must_use]
pub struct ParseReport {
    entries: Vec<Entry>,
    stats: ParseStats,
    duration: Duration,
}

impl ParseReport {
    pub(crate) fn new(entries: Vec<Entry>, stats: ParseStats, duration: Duration) -> Self {
        Self {
            entries,
            stats,
            duration,
        }
    }

    /// Same entries [`RuleSet::parse_file()`](crate::RuleSet::parse_file) returns.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    #[must_use]
    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for ParseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "entries: {}, lines: {} ({} metadata, {} content, {} blank, {} dropped)",
            self.entries.len(),
            self.stats.total_lines,
            self.stats.metadata_lines,
            self.stats.content_lines,
            self.stats.blank_lines,
            self.stats.dropped_lines,
        )?;
        let types: Vec<String> = self
            .stats
            .segment_types
            .iter()
            .map(|(t, n)| format!("{t}={n}"))
            .collect();
        write!(f, ", segments: [{}]", types.join(", "))?;
        write!(f, ", duration: {:?}", self.duration)
    }
}

/// Result of [`RuleEngine::process_detailed()`](crate::RuleEngine::process_detailed).
#[derive(Debug, Clone)]
#[must_use]
pub struct ProcessReport {
    record: Record,
    fired: Vec<String>,
    duration: Duration,
}

impl ProcessReport {
    pub(crate) fn new(record: Record, fired: Vec<String>, duration: Duration) -> Self {
        Self {
            record,
            fired,
            duration,
        }
    }

    /// The processed record, same as [`RuleEngine::process()`](crate::RuleEngine::process).
    #[must_use]
    pub fn record(&self) -> &Record {
        &self.record
    }

    #[must_use]
    pub fn into_record(self) -> Record {
        self.record
    }

    /// Names of the rules that matched and were applied, in firing order.
    #[must_use]
    pub fn fired(&self) -> &[String] {
        &self.fired
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for ProcessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fired: [{}]", self.fired.join(", "))?;
        write!(f, ", fields: {}", self.record.len())?;
        write!(f, ", duration: {:?}", self.duration)
    }
}

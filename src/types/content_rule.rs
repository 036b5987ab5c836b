use std::fmt;

use serde::{Deserialize, Serialize};

use super::pattern::Pattern;

/// Priority assigned to rules whose definition omits one.
pub const DEFAULT_PRIORITY: i64 = 50;

/// How a content rule's match span is turned into segment boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchDiscipline {
    /// Text before and after the match is segmented on its own; the match is one segment.
    Enclosed,
    /// The match starts a segment that runs to the end of the remaining text.
    Prefix,
    /// The segment runs from the start of the remaining text through the match end.
    Suffix,
}

impl MatchDiscipline {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MatchDiscipline::Enclosed => "enclosed",
            MatchDiscipline::Prefix => "prefix",
            MatchDiscipline::Suffix => "suffix",
        }
    }
}

impl fmt::Display for MatchDiscipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled content rule: patterns that classify a span of a line as
/// `segment_type`.
///
/// Built by [`RuleSetBuilder`](super::RuleSetBuilder) or loaded from a
/// configuration document; never constructed with uncompiled patterns.
#[derive(Debug, Clone)]
pub struct ContentRule {
    pub(crate) segment_type: String,
    pub(crate) discipline: MatchDiscipline,
    pub(crate) patterns: Vec<Pattern>,
    pub(crate) group_names: Vec<String>,
    pub(crate) priority: i64,
}

impl ContentRule {
    /// The type tag given to segments this rule produces.
    #[must_use]
    pub fn segment_type(&self) -> &str {
        &self.segment_type
    }

    #[must_use]
    pub fn discipline(&self) -> MatchDiscipline {
        self.discipline
    }

    #[must_use]
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    #[must_use]
    pub fn group_names(&self) -> &[String] {
        &self.group_names
    }

    #[must_use]
    pub fn priority(&self) -> i64 {
        self.priority
    }
}

/// A compiled metadata rule. Its patterns only match at the start of a line.
#[derive(Debug, Clone)]
pub struct MetadataRule {
    pub(crate) patterns: Vec<Pattern>,
    pub(crate) group_names: Vec<String>,
    pub(crate) priority: i64,
}

impl MetadataRule {
    #[must_use]
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    #[must_use]
    pub fn group_names(&self) -> &[String] {
        &self.group_names
    }

    /// Carried for completeness; metadata rules are tried in declaration order.
    #[must_use]
    pub fn priority(&self) -> i64 {
        self.priority
    }
}

use std::fmt;
use std::path::Path;

use tracing::info;

use crate::config::{ContentRuleDef, MetadataRuleDef, ParserConfig};

use super::content_rule::{ContentRule, MatchDiscipline, MetadataRule, DEFAULT_PRIORITY};
use super::error::ConfigError;
use super::report::ParseReport;
use super::segment::{Entry, Segment};

/// Builder for constructing a [`RuleSet`].
///
/// Rules are defined via closures and compiled into an immutable,
/// thread-safe parser.
///
/// # Example
///
/// ```
/// use conventionalrp::{MatchDiscipline, RuleSetBuilder};
///
/// let ruleset = RuleSetBuilder::new()
///     .metadata(|m| m.pattern(r"<(\w+)>").groups(["speaker"]))
///     .content("dice_roll", MatchDiscipline::Enclosed, |r| {
///         r.pattern(r"\[d(\d+)=(\d+)\]").groups(["dice", "result"]).priority(90)
///     })
///     .content("dialogue", MatchDiscipline::Enclosed, |r| r.pattern("「(.+?)」"))
///     .compile()
///     .unwrap();
///
/// let segments = ruleset.parse("x [d20=18] y");
/// assert_eq!(segments[1].field("result"), Some("18"));
/// ```
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    config: ParserConfig,
}

/// Intermediate builder passed to the rule definition closures.
#[derive(Debug)]
pub struct PatternRuleBuilder {
    patterns: Vec<String>,
    groups: Vec<String>,
    priority: i64,
}

impl RuleSetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a metadata rule. Metadata rules are tried in the order they are added.
    #[must_use]
    pub fn metadata(mut self, f: impl FnOnce(PatternRuleBuilder) -> PatternRuleBuilder) -> Self {
        let b = f(PatternRuleBuilder::new());
        self.config.metadata.push(MetadataRuleDef {
            patterns: b.patterns,
            groups: b.groups,
            priority: b.priority,
        });
        self
    }

    /// Add a content rule producing segments of `segment_type`.
    ///
    /// The closure must add at least one pattern, otherwise compilation fails
    /// with [`ConfigError::NoPatterns`].
    #[must_use]
    pub fn content(
        mut self,
        segment_type: &str,
        discipline: MatchDiscipline,
        f: impl FnOnce(PatternRuleBuilder) -> PatternRuleBuilder,
    ) -> Self {
        let b = f(PatternRuleBuilder::new());
        self.config.content.push(ContentRuleDef {
            segment_type: segment_type.to_owned(),
            match_type: discipline,
            patterns: b.patterns,
            groups: b.groups,
            priority: b.priority,
        });
        self
    }

    /// Compile the rules into an immutable `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a pattern does not compile or a rule is incomplete.
    pub fn compile(self) -> Result<RuleSet, ConfigError> {
        crate::compile::compile_ruleset(&self.config)
    }
}

impl PatternRuleBuilder {
    fn new() -> Self {
        Self {
            patterns: Vec::new(),
            groups: Vec::new(),
            priority: DEFAULT_PRIORITY,
        }
    }

    /// Add a pattern. Patterns of one rule are tried in the order added.
    #[must_use]
    pub fn pattern(mut self, pattern: &str) -> Self {
        self.patterns.push(pattern.to_owned());
        self
    }

    /// Names for capture groups 1, 2, ... of every pattern in this rule.
    #[must_use]
    pub fn groups<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.groups = names.into_iter().map(Into::into).collect();
        self
    }

    /// Defaults to 50 when not called.
    #[must_use]
    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }
}

/// A compiled, immutable set of metadata and content rules. Thread-safe and
/// designed to live behind `Arc`.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub(crate) metadata_rules: Vec<MetadataRule>,
    /// Sorted by priority, descending; ties keep declaration order.
    pub(crate) content_rules: Vec<ContentRule>,
}

impl RuleSet {
    /// Segment a single line. Empty and whitespace-only lines yield no segments.
    #[must_use]
    pub fn parse(&self, line: &str) -> Vec<Segment> {
        crate::segment::segment_line(&self.content_rules, line)
    }

    /// Group lines into entries, one per metadata line.
    ///
    /// Content lines seen before the first metadata line belong to no entry
    /// and are dropped.
    #[must_use]
    pub fn parse_file<I, S>(&self, lines: I) -> Vec<Entry>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        crate::segment::parse_lines(self, lines).0
    }

    /// Same as [`parse_file()`](Self::parse_file) over the lines of `text`.
    #[must_use]
    pub fn parse_text(&self, text: &str) -> Vec<Entry> {
        self.parse_file(text.lines())
    }

    /// Parse with line statistics and timing.
    pub fn parse_report<I, S>(&self, lines: I) -> ParseReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let start = std::time::Instant::now();
        let (entries, stats) = crate::segment::parse_lines(self, lines);
        ParseReport::new(entries, stats, start.elapsed())
    }

    /// Compile a rule set from already-deserialized definitions.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a pattern does not compile or a rule is incomplete.
    pub fn from_config(config: &ParserConfig) -> Result<Self, ConfigError> {
        crate::compile::compile_ruleset(config)
    }

    /// Parse a configuration document and compile it into a `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`ConventionalRpError`](crate::ConventionalRpError) on parse or
    /// configuration failure.
    pub fn from_config_str(input: &str) -> Result<Self, crate::ConventionalRpError> {
        let document = crate::parse::parse_document(input)?;
        let config = ParserConfig::from_json(document)?;
        let ruleset = Self::from_config(&config)?;
        info!(
            metadata_rules = ruleset.metadata_rules.len(),
            content_rules = ruleset.content_rules.len(),
            "loaded parser rules"
        );
        Ok(ruleset)
    }

    /// Read a configuration file and compile it into a `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`ConventionalRpError`](crate::ConventionalRpError) on I/O,
    /// parse, or configuration failure.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::ConventionalRpError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_config_str(&input)
    }

    #[must_use]
    pub fn metadata_rules(&self) -> &[MetadataRule] {
        &self.metadata_rules
    }

    /// Content rules in evaluation order.
    #[must_use]
    pub fn content_rules(&self) -> &[ContentRule] {
        &self.content_rules
    }

    /// The definitions this rule set was compiled from, content rules in
    /// evaluation order.
    #[must_use]
    pub fn to_config(&self) -> ParserConfig {
        ParserConfig {
            metadata: self
                .metadata_rules
                .iter()
                .map(|m| MetadataRuleDef {
                    patterns: m.patterns.iter().map(|p| p.as_str().to_owned()).collect(),
                    groups: m.group_names.clone(),
                    priority: m.priority,
                })
                .collect(),
            content: self
                .content_rules
                .iter()
                .map(|c| ContentRuleDef {
                    segment_type: c.segment_type.clone(),
                    match_type: c.discipline,
                    patterns: c.patterns.iter().map(|p| p.as_str().to_owned()).collect(),
                    groups: c.group_names.clone(),
                    priority: c.priority,
                })
                .collect(),
        }
    }
}

#[cfg(feature = "binary-cache")]
impl RuleSet {
    /// Serialize this rule set to a byte vector.
    ///
    /// The optional `source_text` is hashed (BLAKE3) and embedded in the
    /// payload metadata. Callers can use this to detect when the original
    /// configuration has changed and the cache should be rebuilt.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) if encoding fails.
    pub fn to_bytes(
        &self,
        source_text: Option<&str>,
    ) -> Result<Vec<u8>, crate::serial::SerializeError> {
        crate::serial::encode(self, source_text)
    }

    /// Deserialize a rule set from bytes produced by [`to_bytes`](Self::to_bytes).
    /// Patterns are recompiled.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// format, integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::serial::DeserializeError> {
        crate::serial::decode(bytes)
    }

    /// Serialize this rule set and write it to a file.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) on
    /// encoding or I/O failure.
    pub fn to_binary_file(
        &self,
        path: impl AsRef<Path>,
        source_text: Option<&str>,
    ) -> Result<(), crate::serial::SerializeError> {
        let bytes = self.to_bytes(source_text)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a file and deserialize the rule set it contains.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// I/O, format, integrity, or validation failure.
    pub fn from_binary_file(path: impl AsRef<Path>) -> Result<Self, crate::serial::DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RuleSet({} metadata rules, {} content rules)",
            self.metadata_rules.len(),
            self.content_rules.len(),
        )
    }
}

use std::collections::BTreeMap;
use std::fmt;

use regex::{Captures, Regex};

/// A compiled regular expression plus the source text it was built from.
///
/// Immutable once built and cheap to clone; matching keeps no state between
/// calls, so a single `Pattern` can serve any number of threads.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile an unanchored pattern.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`regex::Error`] for malformed syntax.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: source.to_owned(),
            regex: Regex::new(source)?,
        })
    }

    /// Compile a pattern that may only match at the very start of the input.
    pub(crate) fn anchored(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: source.to_owned(),
            regex: Regex::new(&format!(r"\A(?:{source})"))?,
        })
    }

    /// The pattern text as written in the rule definition.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Number of capture groups, not counting the implicit whole-match group.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.regex.captures_len() - 1
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Leftmost match anywhere in `text`.
    #[must_use]
    pub fn find<'t>(&self, text: &'t str) -> Option<PatternMatch<'t>> {
        self.regex.captures(text).map(|caps| PatternMatch { caps })
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

/// One successful match of a [`Pattern`], borrowing the searched text.
#[derive(Debug)]
pub struct PatternMatch<'t> {
    caps: Captures<'t>,
}

impl<'t> PatternMatch<'t> {
    /// Byte offset where the match starts.
    #[must_use]
    pub fn start(&self) -> usize {
        self.caps.get(0).map_or(0, |m| m.start())
    }

    /// Byte offset one past the end of the match.
    #[must_use]
    pub fn end(&self) -> usize {
        self.caps.get(0).map_or(0, |m| m.end())
    }

    /// The text of capture group `index`; empty when the group did not participate.
    #[must_use]
    pub fn group(&self, index: usize) -> &'t str {
        self.caps.get(index).map_or("", |m| m.as_str())
    }

    /// Map capture groups `1..=names.len()` onto `names`.
    ///
    /// Groups beyond `names` are ignored; names beyond the available groups
    /// get an empty string.
    #[must_use]
    pub fn fields(&self, names: &[String]) -> BTreeMap<String, String> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), self.group(i + 1).to_owned()))
            .collect()
    }
}

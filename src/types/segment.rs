use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::record::Record;
use super::value::Value;

/// Segment type given to text no content rule matched.
pub const UNKNOWN: &str = "unknown";

/// Segment type written into records produced by [`Entry::to_record`].
pub const ENTRY_TYPE: &str = "entry";

/// One typed span of a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(rename = "type")]
    segment_type: String,
    content: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    fields: BTreeMap<String, String>,
}

impl Segment {
    pub(crate) fn new(
        segment_type: impl Into<String>,
        content: impl Into<String>,
        fields: BTreeMap<String, String>,
    ) -> Self {
        Self {
            segment_type: segment_type.into(),
            content: content.into(),
            fields,
        }
    }

    pub(crate) fn unknown(content: impl Into<String>) -> Self {
        Self::new(UNKNOWN, content, BTreeMap::new())
    }

    #[must_use]
    pub fn segment_type(&self) -> &str {
        &self.segment_type
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.segment_type == UNKNOWN
    }

    /// Flatten into a record: capture fields plus `type` and `content`.
    ///
    /// A capture group named `type` or `content` is shadowed by the segment's own value.
    #[must_use]
    pub fn to_record(&self) -> Record {
        let mut record: Record = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
            .collect();
        record.insert("type", self.segment_type.as_str());
        record.insert("content", self.content.as_str());
        record
    }
}

/// One speaker turn: the fields of the metadata line that opened it and the
/// segments of every content line up to the next metadata line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    metadata: BTreeMap<String, String>,
    segments: Vec<Segment>,
}

impl Entry {
    pub(crate) fn new(metadata: BTreeMap<String, String>) -> Self {
        Self {
            metadata,
            segments: Vec::new(),
        }
    }

    pub(crate) fn extend(&mut self, segments: impl IntoIterator<Item = Segment>) {
        self.segments.extend(segments);
    }

    #[must_use]
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    #[must_use]
    pub fn meta(&self, name: &str) -> Option<&str> {
        self.metadata.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Segments of the given type, in order.
    pub fn segments_of<'a>(&'a self, segment_type: &'a str) -> impl Iterator<Item = &'a Segment> {
        self.segments
            .iter()
            .filter(move |s| s.segment_type == segment_type)
    }

    /// The entry as a single record: metadata fields, `type = "entry"` and a
    /// `segments` list holding each segment's record as a map.
    #[must_use]
    pub fn to_record(&self) -> Record {
        let mut record: Record = self
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
            .collect();
        record.insert("type", ENTRY_TYPE);
        record.insert(
            "segments",
            Value::List(
                self.segments
                    .iter()
                    .map(|s| Value::Map(s.to_record().into_inner()))
                    .collect(),
            ),
        );
        record
    }

    /// One record per segment, each carrying the entry's metadata fields
    /// unless the segment already has a field of the same name.
    #[must_use]
    pub fn flatten(&self) -> Vec<Record> {
        self.segments
            .iter()
            .map(|segment| {
                let mut record = segment.to_record();
                for (k, v) in &self.metadata {
                    if !record.contains(k) {
                        record.insert(k, v.as_str());
                    }
                }
                record
            })
            .collect()
    }
}

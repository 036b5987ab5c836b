use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use super::Value;

/// Field name under which [`Action::AddTag`](super::Action::AddTag) collects tags.
pub const TAGS_FIELD: &str = "tags";

/// A flat mapping from field name to [`Value`]: the unit the
/// [`RuleEngine`](crate::RuleEngine) reads and rewrites.
///
/// Segments and entries become records via
/// [`Segment::to_record`](super::Segment::to_record) and
/// [`Entry::to_record`](super::Entry::to_record).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, consuming and returning the record.
    #[must_use]
    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Insert a field, returning the previous value if there was one.
    pub fn insert(&mut self, field: &str, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.to_owned(), value.into())
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over `(field, value)` pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The string entries of the `tags` list, in insertion order.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        self.get(TAGS_FIELD)
            .and_then(Value::as_list)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().contains(&tag)
    }

    /// Build a record from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotAnObject`] for any other JSON shape.
    pub fn from_json(json: serde_json::Value) -> Result<Self, ValidationError> {
        match json {
            serde_json::Value::Object(map) => Ok(map
                .into_iter()
                .map(|(k, v)| (k, Value::from(v)))
                .collect()),
            other => Err(ValidationError::NotAnObject {
                found: json_kind(&other),
            }),
        }
    }

    /// Convert into a JSON object, e.g. for handing off to a renderer.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::from(v.clone())))
                .collect(),
        )
    }

    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.fields
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl From<BTreeMap<String, Value>> for Record {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let record = Record::new().set("speaker", "DM");
        assert_eq!(record.get("speaker"), Some(&Value::from("DM")));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn overwrite_value() {
        let record = Record::new().set("result", 10).set("result", 20);
        assert_eq!(record.get("result"), Some(&Value::Int(20)));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn insert_returns_previous() {
        let mut record = Record::new();
        assert_eq!(record.insert("k", true), None);
        assert_eq!(record.insert("k", false), Some(Value::Bool(true)));
    }

    #[test]
    fn remove_and_contains() {
        let mut record = Record::new().set("a", 1);
        assert!(record.contains("a"));
        assert_eq!(record.remove("a"), Some(Value::Int(1)));
        assert!(!record.contains("a"));
        assert!(record.is_empty());
    }

    #[test]
    fn tags_ignore_non_strings() {
        let record = Record::new().set(
            TAGS_FIELD,
            Value::List(vec![Value::from("combat"), Value::Int(3), Value::from("loot")]),
        );
        assert_eq!(record.tags(), vec!["combat", "loot"]);
        assert!(record.has_tag("loot"));
        assert!(!record.has_tag("3"));
    }

    #[test]
    fn from_json_object() {
        let record = Record::from_json(serde_json::json!({"type": "dice_roll", "result": 18}))
            .unwrap();
        assert_eq!(record.get("type"), Some(&Value::from("dice_roll")));
        assert_eq!(record.get("result"), Some(&Value::Int(18)));
    }

    #[test]
    fn from_json_rejects_non_objects() {
        let err = Record::from_json(serde_json::json!([1, 2])).unwrap_err();
        assert!(matches!(err, ValidationError::NotAnObject { found: "array" }));
    }

    #[test]
    fn serializes_as_plain_map() {
        let record = Record::new().set("a", 1).set("b", "x");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"a":1,"b":"x"}"#);
        assert_eq!(record.to_json(), serde_json::json!({"a": 1, "b": "x"}));
    }
}

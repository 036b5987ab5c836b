use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Value;

/// A mutation a rule applies to the record it matched.
///
/// Deserializes from the configuration shape `{ "type": "set_field", ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Overwrite `field` with `value`.
    SetField {
        field: String,
        #[serde(default)]
        value: Value,
    },
    /// Set `field` to `value` only when it is absent.
    AddField {
        field: String,
        #[serde(default)]
        value: Value,
    },
    RemoveField { field: String },
    /// Replace `field` with the result of a named function, when present.
    Transform {
        field: String,
        function: TransformFn,
    },
    /// Append `tag` to the `tags` list unless already there.
    AddTag { tag: String },
    CopyField { source: String, target: String },
}

impl Action {
    #[must_use]
    pub fn set_field(field: &str, value: impl Into<Value>) -> Self {
        Action::SetField {
            field: field.to_owned(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn add_field(field: &str, value: impl Into<Value>) -> Self {
        Action::AddField {
            field: field.to_owned(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn remove_field(field: &str) -> Self {
        Action::RemoveField {
            field: field.to_owned(),
        }
    }

    #[must_use]
    pub fn transform(field: &str, function: impl Into<TransformFn>) -> Self {
        Action::Transform {
            field: field.to_owned(),
            function: function.into(),
        }
    }

    #[must_use]
    pub fn add_tag(tag: &str) -> Self {
        Action::AddTag {
            tag: tag.to_owned(),
        }
    }

    #[must_use]
    pub fn copy_field(source: &str, target: &str) -> Self {
        Action::CopyField {
            source: source.to_owned(),
            target: target.to_owned(),
        }
    }

    /// The configuration name of this action kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Action::SetField { .. } => "set_field",
            Action::AddField { .. } => "add_field",
            Action::RemoveField { .. } => "remove_field",
            Action::Transform { .. } => "transform",
            Action::AddTag { .. } => "add_tag",
            Action::CopyField { .. } => "copy_field",
        }
    }
}

/// A named pure function usable in [`Action::Transform`].
///
/// Unrecognized names are kept as [`TransformFn::Other`]; applying one fails
/// with [`TransformError::UnknownFunction`] and the engine leaves the field as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransformFn {
    Upper,
    Lower,
    Strip,
    Int,
    Float,
    Len,
    Other(String),
}

impl TransformFn {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            TransformFn::Upper => "upper",
            TransformFn::Lower => "lower",
            TransformFn::Strip => "strip",
            TransformFn::Int => "int",
            TransformFn::Float => "float",
            TransformFn::Len => "len",
            TransformFn::Other(name) => name,
        }
    }

    /// Apply the function to a field value.
    ///
    /// # Errors
    ///
    /// [`TransformError::UnknownFunction`] for [`TransformFn::Other`];
    /// [`TransformError::NotConvertible`] when `int`/`float` cannot cast the value.
    pub fn apply(&self, value: &Value) -> Result<Value, TransformError> {
        match self {
            TransformFn::Upper => Ok(Value::String(value.stringify().to_uppercase())),
            TransformFn::Lower => Ok(Value::String(value.stringify().to_lowercase())),
            TransformFn::Strip => Ok(Value::String(value.stringify().trim().to_owned())),
            TransformFn::Int => to_int(value)
                .map(Value::Int)
                .ok_or_else(|| self.not_convertible(value)),
            TransformFn::Float => value
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| self.not_convertible(value)),
            TransformFn::Len => Ok(Value::Int(len_of(value))),
            TransformFn::Other(name) => Err(TransformError::UnknownFunction { name: name.clone() }),
        }
    }

    fn not_convertible(&self, value: &Value) -> TransformError {
        TransformError::NotConvertible {
            function: self.name().to_owned(),
            value: format!("{value:?}"),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Int(v) => Some(*v),
        Value::Float(v) if v.is_finite() && v.abs() < 9.2e18 => Some(v.trunc() as i64),
        Value::Bool(v) => Some(i64::from(*v)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[allow(clippy::cast_possible_wrap)]
fn len_of(value: &Value) -> i64 {
    let n = match value {
        Value::String(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Map(map) => map.len(),
        _ => 0,
    };
    n as i64
}

impl From<String> for TransformFn {
    fn from(name: String) -> Self {
        match name.as_str() {
            "upper" => TransformFn::Upper,
            "lower" => TransformFn::Lower,
            "strip" => TransformFn::Strip,
            "int" => TransformFn::Int,
            "float" => TransformFn::Float,
            "len" => TransformFn::Len,
            _ => TransformFn::Other(name),
        }
    }
}

impl From<&str> for TransformFn {
    fn from(name: &str) -> Self {
        TransformFn::from(name.to_owned())
    }
}

impl From<TransformFn> for String {
    fn from(f: TransformFn) -> Self {
        match f {
            TransformFn::Other(name) => name,
            known => known.name().to_owned(),
        }
    }
}

impl fmt::Display for TransformFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a transform could not produce a new value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("unknown transform function '{name}'")]
    UnknownFunction { name: String },

    #[error("'{function}' cannot convert {value}")]
    NotConvertible { function: String, value: String },
}

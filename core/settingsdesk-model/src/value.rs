//! Declared value types and the comparison rules shared by the engine.

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// How an incoming value is coerced before it is persisted.
///
/// Plain-text covers `string` and every field kind without a dedicated
/// coercion (`input`, `text`, `textarea`, `select`, `checkbox`, `color`,
/// `switch`, `shortcodes`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ValueType {
    Number,
    Boolean,
    Object,
    Html,
    #[default]
    PlainText,
}

impl ValueType {
    /// Parses a declared type tag.
    pub fn parse(tag: &str) -> ModelResult<Self> {
        match tag {
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            "object" => Ok(Self::Object),
            "html" => Ok(Self::Html),
            "string" | "input" | "text" | "textarea" | "select" | "checkbox" | "color"
            | "switch" | "shortcodes" => Ok(Self::PlainText),
            other => Err(ModelError::unknown("value", other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Html => "html",
            Self::PlainText => "string",
        }
    }
}

impl FromStr for ValueType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ValueType {
    type Error = ModelError;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        Self::parse(&tag)
    }
}

impl From<ValueType> for String {
    fn from(value_type: ValueType) -> Self {
        value_type.as_str().to_string()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Element mapping used when an `object` value falls back to a comma list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ObjectValuesType {
    Number,
    #[default]
    Text,
}

impl From<String> for ObjectValuesType {
    fn from(tag: String) -> Self {
        if tag == "number" {
            Self::Number
        } else {
            Self::Text
        }
    }
}

impl From<ObjectValuesType> for String {
    fn from(kind: ObjectValuesType) -> Self {
        match kind {
            ObjectValuesType::Number => "number".into(),
            ObjectValuesType::Text => "string".into(),
        }
    }
}

/// Compares two JSON values the way form input compares with stored data.
///
/// Beyond strict equality, a numeric string equals the number it spells
/// (`"12"` == `12`), integer and float representations of the same number are
/// equal, and a boolean equals its textual forms (`"true"`/`"1"` and
/// `"false"`/`"0"`/`""`).
pub fn loosely_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            match (n.as_f64(), s.trim().parse::<f64>()) {
                (Some(x), Ok(y)) => x == y,
                _ => false,
            }
        }
        (Value::Bool(flag), Value::String(s)) | (Value::String(s), Value::Bool(flag)) => {
            match s.as_str() {
                "true" | "1" => *flag,
                "false" | "0" | "" => !*flag,
                _ => false,
            }
        }
        _ => false,
    }
}

/// Renders a scalar as the text a form would submit. `null` renders empty.
pub fn display_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

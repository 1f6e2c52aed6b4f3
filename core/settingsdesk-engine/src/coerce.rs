//! Type-directed coercion of incoming values before they are persisted.

use crate::sanitize::{sanitize_html, sanitize_text};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use settingsdesk_model::{display_text, ObjectValuesType, ValueType};
use std::sync::LazyLock;

static NUMERIC_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)")
        .expect("numeric prefix pattern is valid")
});

static NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?\s*$")
        .expect("numeric pattern is valid")
});

/// Key whose string leaves are kept verbatim inside `object` values.
const VERBATIM_KEY: &str = "values";

/// Per-request knobs for [`coerce`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoerceOptions {
    /// Element mapping for `object` values that fall back to a comma list.
    #[serde(default)]
    pub object_values_type: ObjectValuesType,
}

/// Coerces `raw` according to its declared type.
///
/// Never fails: malformed input degrades to the type's neutral value.
pub fn coerce(raw: &Value, value_type: ValueType, options: CoerceOptions) -> Value {
    match value_type {
        ValueType::Number => Value::from(int_value(raw)),
        ValueType::Boolean => Value::Bool(matches!(raw, Value::Bool(true)) || raw == "true"),
        ValueType::Object => coerce_object(raw, options),
        ValueType::Html => Value::String(sanitize_html(&display_text(raw))),
        ValueType::PlainText => Value::String(sanitize_text(&display_text(raw))),
    }
}

/// Integer value of `raw` using leading-numeric-prefix semantics:
/// `"12px"` → 12, `"3.9"` → 3, `"abc"` → 0.
pub fn int_value(raw: &Value) -> i64 {
    match raw {
        Value::Number(n) => n.as_i64().unwrap_or_else(|| truncate(n.as_f64().unwrap_or(0.0))),
        Value::Bool(b) => i64::from(*b),
        Value::String(s) => parse_prefix(s),
        Value::Array(items) => i64::from(!items.is_empty()),
        Value::Object(map) => i64::from(!map.is_empty()),
        Value::Null => 0,
    }
}

fn parse_prefix(s: &str) -> i64 {
    NUMERIC_PREFIX
        .captures(s)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .map(truncate)
        .unwrap_or(0)
}

fn truncate(x: f64) -> i64 {
    // `as` saturates at the i64 bounds and maps NaN to 0.
    x.trunc() as i64
}

/// True when `s` spells a number in full (surrounding whitespace allowed).
pub fn is_numeric(s: &str) -> bool {
    NUMERIC.is_match(s)
}

fn coerce_object(raw: &Value, options: CoerceOptions) -> Value {
    let decoded = match raw {
        Value::String(s) => serde_json::from_str::<Value>(s).ok(),
        Value::Array(_) | Value::Object(_) => Some(raw.clone()),
        _ => None,
    };
    if let Some(tree) = decoded.filter(is_filled_collection) {
        return sanitize_tree(tree, None);
    }

    match raw {
        Value::Array(items) => Value::Array(items.clone()),
        Value::Object(_) | Value::Null | Value::Bool(false) => Value::Array(Vec::new()),
        other => {
            let text = display_text(other);
            if text.is_empty() {
                return Value::Array(Vec::new());
            }
            text.split(',')
                .map(|item| match options.object_values_type {
                    ObjectValuesType::Number => Value::from(parse_prefix(item)),
                    ObjectValuesType::Text => Value::String(sanitize_text(item)),
                })
                .collect()
        }
    }
}

fn is_filled_collection(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => false,
    }
}

/// Sanitizes every leaf of a decoded `object` value.
fn sanitize_tree(node: Value, key: Option<&str>) -> Value {
    match node {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| sanitize_tree(item, None))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| {
                    let v = sanitize_tree(v, Some(k.as_str()));
                    (k, v)
                })
                .collect::<Map<_, _>>(),
        ),
        leaf => sanitize_leaf(leaf, key),
    }
}

fn sanitize_leaf(leaf: Value, key: Option<&str>) -> Value {
    match leaf {
        Value::Number(n) => n.as_f64().map_or(Value::Null, Value::from),
        Value::Bool(b) => Value::Bool(b),
        Value::Null => Value::Bool(false),
        Value::String(s) if is_numeric(&s) => s
            .trim()
            .parse::<f64>()
            .map_or(Value::Null, Value::from),
        Value::String(s) if s == "true" => Value::Bool(true),
        Value::String(s) if s.is_empty() || s == "false" => Value::Bool(false),
        Value::String(s) if key == Some(VERBATIM_KEY) => Value::String(s),
        Value::String(s) => Value::String(sanitize_text(&s)),
        collection => collection,
    }
}

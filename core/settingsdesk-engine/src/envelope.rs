//! The response shape every facade operation returns.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{success, value?, payload?, text}` as consumed by the admin UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default)]
    pub text: String,
}

impl Envelope {
    /// A successful response carrying `value`.
    pub fn ok(value: Value) -> Self {
        Self {
            success: true,
            value: Some(value),
            payload: None,
            text: String::new(),
        }
    }

    /// A successful response carrying a structured payload.
    pub fn payload(payload: Value) -> Self {
        Self {
            success: true,
            value: None,
            payload: Some(payload),
            text: String::new(),
        }
    }

    pub fn fail(text: impl Into<String>) -> Self {
        Self {
            success: false,
            value: None,
            payload: None,
            text: text.into(),
        }
    }

    pub fn from_error(err: &EngineError) -> Self {
        Self::fail(err.to_string())
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

impl From<EngineError> for Envelope {
    fn from(err: EngineError) -> Self {
        Self::from_error(&err)
    }
}

//! Error types for schema and entity parsing.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while interpreting schema declarations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A `type` tag that is not part of the closed set for its axis
    /// (`field`, `column` or `value`).
    #[error("unknown {axis} kind `{tag}`")]
    UnknownKind { axis: &'static str, tag: String },

    /// A schema node has the wrong shape.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ModelError {
    pub(crate) fn unknown(axis: &'static str, tag: impl Into<String>) -> Self {
        Self::UnknownKind {
            axis,
            tag: tag.into(),
        }
    }
}

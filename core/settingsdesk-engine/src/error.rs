//! Error types for the engine.

use settingsdesk_model::ModelError;
use settingsdesk_storage::StorageError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised inside the engine. None of them cross the facade: every
/// public [`crate::SettingsEngine`] operation folds them into an envelope.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A declared type tag outside its closed set.
    #[error("unknown {axis} kind `{tag}`")]
    UnknownKind { axis: &'static str, tag: String },

    /// Schema could not be interpreted.
    #[error(transparent)]
    Model(ModelError),

    /// A collaborator store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A save guard refused the request.
    #[error("{0}")]
    PermissionDenied(String),

    /// The addressed view, record or principal does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A required request field is absent.
    #[error("missing input: {0}")]
    MissingInput(&'static str),
}

impl From<ModelError> for EngineError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::UnknownKind { axis, tag } => Self::UnknownKind { axis, tag },
            other => Self::Model(other),
        }
    }
}

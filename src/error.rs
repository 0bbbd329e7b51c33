use crate::reducer::ActionKind;
use thiserror::Error;

/// Errors raised while loading or saving a serialized graph document.
#[derive(Error, Debug, Clone)]
pub enum DocumentError {
    #[error("Failed to parse graph JSON: {0}")]
    JsonParseError(String),

    #[error("Failed to serialize graph: {0}")]
    SerializeError(String),

    #[error("Graph document has no pages")]
    MissingPage,
}

/// Errors raised by the path resolver and the config mutator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Invalid path {keys:?}: {message}")]
    InvalidPath { keys: Vec<String>, message: String },

    #[error("Parent path does not exist: {0}")]
    MissingParentPath(String),

    #[error("Shape '{shape_id}' has no root config at '{location}'")]
    CorruptShape { shape_id: String, location: String },
}

impl PathError {
    pub(crate) fn invalid(keys: &[String], message: impl Into<String>) -> Self {
        PathError::InvalidPath {
            keys: keys.to_vec(),
            message: message.into(),
        }
    }
}

/// Errors raised while dispatching actions through a component's reducers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReduceError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Action '{kind}' has an invalid payload: {message}")]
    InvalidPayload { kind: String, message: String },

    #[error("A reducer for action '{0}' is already registered")]
    DuplicateReducer(ActionKind),

    #[error("Config cannot be reduced: {0}")]
    InvalidConfig(String),
}

/// A compatibility processor found a shape it cannot bring to the current schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompatibilityError {
    #[error("Shape '{shape_id}' ({shape_type}) is corrupt: '{missing}' is missing")]
    CorruptShape {
        shape_id: String,
        shape_type: String,
        missing: String,
    },
}

/// Umbrella error returned by the graph operator.
#[derive(Error, Debug, Clone)]
pub enum GraphError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Reduce(#[from] ReduceError),

    #[error(transparent)]
    Compatibility(#[from] CompatibilityError),
}

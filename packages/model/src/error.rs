use thiserror::Error;

/// Errors raised by the document model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Unknown mark type: {0}")]
    UnknownMarkType(String),

    #[error("Index {0} out of bounds")]
    IndexOutOfBounds(usize),

    #[error("Position {0} out of range")]
    PositionOutOfRange(usize),

    #[error("Cannot join incompatible nodes")]
    CannotJoin,

    #[error("No value supplied for attribute {0}")]
    MissingAttribute(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
}

impl ModelError {
    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::InvalidJson(message.into())
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::InvalidJson(e.to_string())
    }
}

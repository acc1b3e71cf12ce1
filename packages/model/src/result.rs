use crate::error::ModelError;

/// Result type used throughout the document model
pub type ModelResult<T> = Result<T, ModelError>;

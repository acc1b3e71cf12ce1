//! Error types for editor state

use quire_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("No node at position {0}")]
    NoNodeAt(usize),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),
}

impl From<serde_json::Error> for StateError {
    fn from(e: serde_json::Error) -> Self {
        StateError::Model(ModelError::from(e))
    }
}

/// Result type used throughout editor state
pub type StateResult<T> = Result<T, StateError>;

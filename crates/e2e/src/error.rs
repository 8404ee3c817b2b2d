//! Error types for test-side helpers

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Checkpoint already exists: {0}")]
    DuplicateCheckpoint(String),

    #[error("Unknown checkpoint: {0}")]
    UnknownCheckpoint(String),

    #[error("Checkpoint {0} has no earlier checkpoint to measure from")]
    NoPreviousCheckpoint(String),

    #[error("Checkpoint {check} was recorded before {last}")]
    CheckpointOrder { check: String, last: String },

    #[error("Logging error: {0}")]
    Logging(String),

    #[error(transparent)]
    Testbed(#[from] testbed_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;

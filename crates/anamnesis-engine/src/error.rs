use thiserror::Error;

/// Engine error taxonomy. None of these are fatal to a session: a
/// validation error leaves the session untouched, extraction errors fall
/// back to a predefined reply, persistence errors keep the ephemeral
/// cache and retry, and state errors leave the stage unchanged.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("persistence failed: {0}")]
    Persistence(String),

    #[error("invalid state transition: {0}")]
    State(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("session document schema_version {found} is newer than this build supports ({supported})")]
    UnsupportedSchemaVersion { found: u32, supported: u32 },
}

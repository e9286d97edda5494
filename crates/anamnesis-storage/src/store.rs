//! The S3-backed session store.
//!
//! One session document per patient under `sessions/`, plus an
//! append-only history collection under `history/{patient_id}/` keyed by
//! snapshot timestamp. History records are never overwritten or pruned
//! by this component.

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use anamnesis_core::models::document::{SessionDocument, SessionHistoryRecord};
use anamnesis_core::store_keys;
use anamnesis_engine::error::EngineError;
use anamnesis_engine::persist::{LoadOutcome, SessionStore};

use crate::error::StorageError;
use crate::objects;

pub struct S3SessionStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3SessionStore {
    pub fn new(config: &aws_config::SdkConfig, bucket: impl Into<String>) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
            bucket: bucket.into(),
        }
    }

    /// Load and decode the session document for a patient. A record that
    /// exists but fails to decode is reported as corrupt, distinct from
    /// a transport failure.
    pub async fn load_document(
        &self,
        patient_id: Uuid,
    ) -> Result<Option<SessionDocument>, StorageError> {
        let key = store_keys::session(patient_id);
        let body = match objects::get_object(&self.client, &self.bucket, &key).await {
            Ok(body) => body,
            Err(StorageError::NotFound { .. }) => return Ok(None),
            Err(error) => return Err(error),
        };

        let document = SessionDocument::from_json(&body).map_err(|e| StorageError::Corrupt {
            key,
            detail: e.to_string(),
        })?;
        Ok(Some(document))
    }

    pub async fn save_document(&self, document: &SessionDocument) -> Result<(), StorageError> {
        let key = store_keys::session(document.patient_id);
        let body = serde_json::to_vec_pretty(document)?;
        objects::put_object(&self.client, &self.bucket, &key, body).await?;
        info!(patient_id = %document.patient_id, %key, "session document saved");
        Ok(())
    }

    pub async fn put_history(&self, record: &SessionHistoryRecord) -> Result<(), StorageError> {
        let key = store_keys::history(record.patient_id, record.snapshot_at);
        let body = serde_json::to_vec_pretty(record)?;
        objects::put_object(&self.client, &self.bucket, &key, body).await?;
        info!(patient_id = %record.patient_id, %key, "history record appended");
        Ok(())
    }

    /// List history record keys for a patient, oldest first.
    pub async fn list_history_keys(&self, patient_id: Uuid) -> Result<Vec<String>, StorageError> {
        let prefix = store_keys::history_prefix(patient_id);
        objects::list_objects(&self.client, &self.bucket, &prefix).await
    }
}

#[async_trait]
impl SessionStore for S3SessionStore {
    async fn load(&self, patient_id: Uuid) -> Result<LoadOutcome, EngineError> {
        match self.load_document(patient_id).await {
            Ok(Some(document)) => Ok(LoadOutcome::Found(document)),
            Ok(None) => Ok(LoadOutcome::Missing),
            Err(StorageError::Corrupt { detail, .. }) => Ok(LoadOutcome::Corrupt { detail }),
            Err(error) => Err(EngineError::Persistence(error.to_string())),
        }
    }

    async fn save(&self, document: &SessionDocument) -> Result<(), EngineError> {
        self.save_document(document)
            .await
            .map_err(|e| EngineError::Persistence(e.to_string()))
    }

    async fn append_history(&self, record: &SessionHistoryRecord) -> Result<(), EngineError> {
        self.put_history(record)
            .await
            .map_err(|e| EngineError::Persistence(e.to_string()))
    }
}

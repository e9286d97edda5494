//! In-process ephemeral cache.
//!
//! The fast tier of the dual-tier persistence scheme. Contents do not
//! survive a process restart — that is what the durable store is for.

use std::collections::HashMap;

use async_trait::async_trait;
use jiff::Timestamp;
use tokio::sync::RwLock;
use uuid::Uuid;

use anamnesis_core::models::document::SessionDocument;

use crate::persist::{CachedDocument, EphemeralCache};

#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<Uuid, CachedDocument>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EphemeralCache for InMemoryCache {
    async fn put(&self, document: SessionDocument, cached_at: Timestamp) {
        let patient_id = document.patient_id;
        self.entries.write().await.insert(
            patient_id,
            CachedDocument {
                document,
                cached_at,
            },
        );
    }

    async fn get(&self, patient_id: Uuid) -> Option<CachedDocument> {
        self.entries.read().await.get(&patient_id).cloned()
    }

    async fn clear(&self, patient_id: Uuid) {
        self.entries.write().await.remove(&patient_id);
    }
}

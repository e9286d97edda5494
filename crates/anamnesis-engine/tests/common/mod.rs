//! Shared test fixtures: an in-memory durable store with failure and
//! corruption injection, plus engine construction helpers.

// Not every test binary uses every fixture.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use anamnesis_core::models::document::{SessionDocument, SessionHistoryRecord};
use anamnesis_core::models::profile::{AgeGroup, DemographicProfile};
use anamnesis_core::models::session::InterviewSession;
use anamnesis_engine::clock::{Clock, ManualClock};
use anamnesis_engine::engagement::AlwaysNotify;
use anamnesis_engine::engine::InterviewEngine;
use anamnesis_engine::error::EngineError;
use anamnesis_engine::memory::InMemoryCache;
use anamnesis_engine::persist::{
    EphemeralCache, LoadOutcome, PersistenceCoordinator, SessionStore,
};

pub fn start_time() -> jiff::Timestamp {
    "2025-06-01T10:00:00Z".parse().unwrap()
}

#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<Uuid, SessionDocument>>,
    history: Mutex<Vec<SessionHistoryRecord>>,
    corrupt: Mutex<HashSet<Uuid>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_document(&self, document: SessionDocument) {
        self.documents
            .lock()
            .await
            .insert(document.patient_id, document);
    }

    pub async fn document(&self, patient_id: Uuid) -> Option<SessionDocument> {
        self.documents.lock().await.get(&patient_id).cloned()
    }

    pub async fn mark_corrupt(&self, patient_id: Uuid) {
        self.corrupt.lock().await.insert(patient_id);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn history_records(&self) -> Vec<SessionHistoryRecord> {
        self.history.lock().await.clone()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, patient_id: Uuid) -> Result<LoadOutcome, EngineError> {
        if self.corrupt.lock().await.contains(&patient_id) {
            return Ok(LoadOutcome::Corrupt {
                detail: "unreadable session document".to_string(),
            });
        }
        Ok(match self.documents.lock().await.get(&patient_id) {
            Some(document) => LoadOutcome::Found(document.clone()),
            None => LoadOutcome::Missing,
        })
    }

    async fn save(&self, document: &SessionDocument) -> Result<(), EngineError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(EngineError::Persistence("simulated outage".to_string()));
        }
        self.documents
            .lock()
            .await
            .insert(document.patient_id, document.clone());
        Ok(())
    }

    async fn append_history(&self, record: &SessionHistoryRecord) -> Result<(), EngineError> {
        self.history.lock().await.push(record.clone());
        Ok(())
    }
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<InMemoryCache>,
    pub clock: Arc<ManualClock>,
    pub coordinator: Arc<PersistenceCoordinator>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_throttle(Duration::from_secs(60))
    }

    pub fn with_throttle(throttle: Duration) -> Self {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(InMemoryCache::new());
        let clock = Arc::new(ManualClock::new(start_time()));
        let coordinator = Arc::new(PersistenceCoordinator::new(
            store.clone(),
            cache.clone() as Arc<dyn EphemeralCache>,
            clock.clone() as Arc<dyn Clock>,
            throttle,
        ));
        Self {
            store,
            cache,
            clock,
            coordinator,
        }
    }

    pub fn engine_for(&self, session: InterviewSession) -> InterviewEngine {
        InterviewEngine::new(
            session,
            DemographicProfile::new(AgeGroup::Adulto),
            self.clock.clone(),
            Arc::new(AlwaysNotify),
            self.coordinator.clone(),
        )
    }

    pub fn new_session(&self, patient_id: Uuid) -> InterviewSession {
        InterviewSession::new(patient_id, start_time())
    }
}

//! Dual-tier session persistence.
//!
//! Every merge updates the ephemeral fast cache; the durable store is
//! written at most once per throttle interval unless a forced write is
//! triggered (pause, explicit save, stage completion, or error
//! recovery). Recovery prefers the cache and reports its age; when both
//! tiers hold data, the copy with the newer `updated_at` wins.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jiff::Timestamp;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use anamnesis_core::models::document::{SessionDocument, SessionHistoryRecord};
use anamnesis_core::models::session::{InterviewSession, SessionStatus};

use crate::anomaly::{Anomaly, AnomalyKind};
use crate::clock::Clock;
use crate::error::EngineError;

/// Result of reading the durable tier.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Found(SessionDocument),
    Missing,
    /// The record exists but cannot be decoded. Forces the
    /// start-new-session path; durable history is never touched.
    Corrupt { detail: String },
}

/// The durable tier: one session document per patient plus an
/// append-only, never-pruned history collection.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, patient_id: Uuid) -> Result<LoadOutcome, EngineError>;
    async fn save(&self, document: &SessionDocument) -> Result<(), EngineError>;
    async fn append_history(&self, record: &SessionHistoryRecord) -> Result<(), EngineError>;
}

/// A cached document together with when it was cached.
#[derive(Debug, Clone)]
pub struct CachedDocument {
    pub document: SessionDocument,
    pub cached_at: Timestamp,
}

/// The ephemeral fast tier, updated on every merge.
#[async_trait]
pub trait EphemeralCache: Send + Sync {
    async fn put(&self, document: SessionDocument, cached_at: Timestamp);
    async fn get(&self, patient_id: Uuid) -> Option<CachedDocument>;
    async fn clear(&self, patient_id: Uuid);
}

/// Where a recovered session came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySource {
    /// Restored from the ephemeral cache; age reported to the user.
    Cache { age_seconds: u64 },
    Durable,
    Fresh,
}

#[derive(Debug, Clone)]
pub struct Recovered {
    pub session: InterviewSession,
    pub source: RecoverySource,
}

#[derive(Debug, Default)]
struct WriteState {
    last_durable_write: Option<Timestamp>,
    retry_pending: bool,
}

/// Coordinates the two tiers and the write policy.
pub struct PersistenceCoordinator {
    store: Arc<dyn SessionStore>,
    cache: Arc<dyn EphemeralCache>,
    clock: Arc<dyn Clock>,
    throttle: Duration,
    state: Mutex<WriteState>,
}

impl PersistenceCoordinator {
    pub const DEFAULT_THROTTLE: Duration = Duration::from_secs(60);

    pub fn new(
        store: Arc<dyn SessionStore>,
        cache: Arc<dyn EphemeralCache>,
        clock: Arc<dyn Clock>,
        throttle: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
            throttle,
            state: Mutex::new(WriteState::default()),
        }
    }

    /// Update the ephemeral tier. Called on every merge.
    pub async fn cache_write(&self, session: &InterviewSession) {
        let document = SessionDocument::from_session(session);
        self.cache.put(document, self.clock.now()).await;
    }

    /// Throttled, best-effort durable write for the autosave tick. A
    /// failure keeps the cache, flags a retry for the next tick, and is
    /// never propagated to the caller.
    pub async fn autosave(&self, session: &InterviewSession) {
        let now = self.clock.now();
        let due = {
            let state = self.state.lock().await;
            state.retry_pending
                || state.last_durable_write.is_none_or(|last| {
                    now.duration_since(last).as_secs() >= self.throttle.as_secs() as i64
                })
        };
        if !due {
            return;
        }

        if let Err(error) = self.write_durable(session).await {
            let mut state = self.state.lock().await;
            state.retry_pending = true;
            Anomaly::new(
                AnomalyKind::PersistenceRetry,
                error.to_string(),
                session.stage,
                now,
            )
            .emit();
        }
    }

    /// Forced durable write: pause, explicit save, stage completion, and
    /// final submission. Awaited; on failure the cache is retained and a
    /// retry is flagged before the error is returned.
    pub async fn force_save(&self, session: &InterviewSession) -> Result<(), EngineError> {
        match self.write_durable(session).await {
            Ok(()) => Ok(()),
            Err(error) => {
                self.state.lock().await.retry_pending = true;
                Err(error)
            }
        }
    }

    /// Whether a durable write failed and is waiting for the next tick.
    pub async fn retry_pending(&self) -> bool {
        self.state.lock().await.retry_pending
    }

    async fn write_durable(&self, session: &InterviewSession) -> Result<(), EngineError> {
        let now = self.clock.now();
        let document = SessionDocument::from_session(session);

        // Read-before-write: a previously completed session is archived
        // into the history collection before new edits overwrite it.
        match self.store.load(session.patient_id).await? {
            LoadOutcome::Found(existing) => {
                if existing.status == SessionStatus::Completed && existing != document {
                    let record = SessionHistoryRecord::from_document(&existing, now);
                    self.store.append_history(&record).await?;
                    info!(
                        patient_id = %session.patient_id,
                        snapshot_at = %now,
                        "archived completed session before overwrite"
                    );
                }
            }
            LoadOutcome::Missing => {}
            LoadOutcome::Corrupt { detail } => {
                // Unreadable — nothing to archive. The overwrite is the
                // recovery.
                Anomaly::new(AnomalyKind::CorruptSessionRecord, detail, session.stage, now)
                    .emit();
            }
        }

        self.store.save(&document).await?;

        let mut state = self.state.lock().await;
        state.last_durable_write = Some(now);
        state.retry_pending = false;
        Ok(())
    }

    /// Recover the session for a patient. Prefers the ephemeral cache
    /// (reporting its age); falls back to the durable store; otherwise
    /// starts a new session. When both tiers hold data the newer
    /// `updated_at` wins.
    pub async fn recover(&self, patient_id: Uuid) -> Result<Recovered, EngineError> {
        let now = self.clock.now();
        let cached = self.cache.get(patient_id).await;

        let durable = match self.store.load(patient_id).await {
            Ok(outcome) => outcome,
            Err(error) if cached.is_some() => {
                warn!(%error, %patient_id, "durable load failed, recovering from cache");
                LoadOutcome::Missing
            }
            Err(error) => return Err(error),
        };

        let recovered = match (cached, durable) {
            (Some(cached), LoadOutcome::Found(durable))
                if durable.updated_at > cached.document.updated_at =>
            {
                Recovered {
                    session: durable.into_session(),
                    source: RecoverySource::Durable,
                }
            }
            (Some(cached), _) => Recovered {
                source: RecoverySource::Cache {
                    age_seconds: now.duration_since(cached.cached_at).as_secs().max(0) as u64,
                },
                session: cached.document.into_session(),
            },
            (None, LoadOutcome::Found(durable)) => Recovered {
                session: durable.into_session(),
                source: RecoverySource::Durable,
            },
            (None, LoadOutcome::Missing) => Recovered {
                session: InterviewSession::new(patient_id, now),
                source: RecoverySource::Fresh,
            },
            (None, LoadOutcome::Corrupt { detail }) => {
                let fresh = InterviewSession::new(patient_id, now);
                Anomaly::new(AnomalyKind::CorruptSessionRecord, detail, fresh.stage, now).emit();
                Recovered {
                    session: fresh,
                    source: RecoverySource::Fresh,
                }
            }
        };

        info!(%patient_id, source = ?recovered.source, "session recovered");
        Ok(recovered)
    }
}

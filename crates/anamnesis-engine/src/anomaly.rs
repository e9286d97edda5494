//! Structured anomaly events.
//!
//! Anomalies are non-fatal inconsistencies observed while driving the
//! interview — an unrecognized topic, a rejected navigation, a durable
//! write that will be retried. They are logged via `tracing` with
//! structured fields and surfaced to observers; they never abort the
//! session.

use jiff::Timestamp;
use serde::Serialize;
use tracing::warn;

use anamnesis_core::models::stage::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    UnknownTopic,
    UnknownSection,
    BackwardHint,
    NavigationRejected,
    ExtractionError,
    PersistenceRetry,
    CorruptSessionRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub detail: String,
    pub stage: Stage,
    pub at: Timestamp,
}

impl Anomaly {
    pub fn new(kind: AnomalyKind, detail: impl Into<String>, stage: Stage, at: Timestamp) -> Self {
        Self {
            kind,
            detail: detail.into(),
            stage,
            at,
        }
    }

    /// Emit this anomaly via tracing.
    pub fn emit(&self) {
        warn!(
            anomaly.kind = ?self.kind,
            anomaly.stage = ?self.stage,
            anomaly.detail = %self.detail,
            "interview anomaly"
        );
    }
}

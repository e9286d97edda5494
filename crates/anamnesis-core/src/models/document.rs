//! Persisted session shapes.
//!
//! [`SessionDocument`] is the durable-store form of a session — one
//! document per patient. [`SessionHistoryRecord`] is the immutable,
//! timestamped snapshot appended before a completed session is
//! overwritten by new edits. History is append-only and never pruned.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

use super::message::Message;
use super::session::{InterviewSession, SessionStatus, StructuredAnswers};
use super::stage::Stage;

/// Current document schema version. Bump this when adding fields or
/// changing shape; each bump requires a corresponding entry in [`migrate`].
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// The durable-store form of an interview session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDocument {
    /// Schema version. Missing or 0 = pre-versioned document.
    #[serde(default)]
    pub schema_version: u32,
    pub session_id: Uuid,
    pub patient_id: Uuid,
    pub stage: Stage,
    #[serde(default)]
    pub current_topic: Option<String>,
    pub structured_answers: StructuredAnswers,
    pub completed_sections: BTreeSet<String>,
    pub status: SessionStatus,
    pub messages: Vec<Message>,
    pub progress: u8,
    pub session_duration_seconds: u64,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
    pub last_input_at: jiff::Timestamp,
}

impl SessionDocument {
    pub fn from_session(session: &InterviewSession) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            session_id: session.id,
            patient_id: session.patient_id,
            stage: session.stage,
            current_topic: session.current_topic.clone(),
            structured_answers: session.structured_answers.clone(),
            completed_sections: session.completed_sections.clone(),
            status: session.status,
            messages: session.messages.clone(),
            progress: session.progress,
            session_duration_seconds: session.session_duration_seconds,
            created_at: session.created_at,
            updated_at: session.updated_at,
            last_input_at: session.last_input_at,
        }
    }

    pub fn into_session(self) -> InterviewSession {
        InterviewSession {
            id: self.session_id,
            patient_id: self.patient_id,
            stage: self.stage,
            current_topic: self.current_topic,
            structured_answers: self.structured_answers,
            completed_sections: self.completed_sections,
            status: self.status,
            messages: self.messages,
            created_at: self.created_at,
            updated_at: self.updated_at,
            session_duration_seconds: self.session_duration_seconds,
            last_input_at: self.last_input_at,
            progress: self.progress,
        }
    }

    /// Parse raw JSON into a document, running schema migrations first.
    pub fn from_json(raw: &[u8]) -> Result<Self, CoreError> {
        let json: serde_json::Value = serde_json::from_slice(raw)?;
        let on_disk_version = json
            .get("schema_version")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;

        let migrated = migrate(json, on_disk_version)?;
        let document: SessionDocument = serde_json::from_value(migrated)?;
        Ok(document)
    }
}

/// Run sequential migrations from `from_version` up to
/// [`CURRENT_SCHEMA_VERSION`]. Each migration is a pure transform on the
/// raw JSON value.
fn migrate(mut json: serde_json::Value, from_version: u32) -> Result<serde_json::Value, CoreError> {
    if from_version > CURRENT_SCHEMA_VERSION {
        return Err(CoreError::UnsupportedSchemaVersion {
            found: from_version,
            supported: CURRENT_SCHEMA_VERSION,
        });
    }

    // v0 → v1: documents written before engagement tracking lack the
    // duration and last-input fields.
    if from_version < 1 {
        if let Some(obj) = json.as_object_mut() {
            obj.entry("session_duration_seconds")
                .or_insert(serde_json::Value::Number(0.into()));
            if !obj.contains_key("last_input_at") {
                if let Some(updated) = obj.get("updated_at").cloned() {
                    obj.insert("last_input_at".to_string(), updated);
                }
            }
            obj.insert(
                "schema_version".to_string(),
                serde_json::Value::Number(1.into()),
            );
        }
    }

    // Future migrations go here:
    // if from_version < 2 { ... }

    Ok(json)
}

/// An immutable snapshot of a session's structured content, written to the
/// append-only history collection before a completed session is reopened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionHistoryRecord {
    pub patient_id: Uuid,
    pub session_id: Uuid,
    pub snapshot_at: jiff::Timestamp,
    pub stage: Stage,
    pub structured_answers: StructuredAnswers,
    pub completed_sections: BTreeSet<String>,
    pub progress: u8,
    pub messages: Vec<Message>,
}

impl SessionHistoryRecord {
    pub fn from_document(document: &SessionDocument, snapshot_at: jiff::Timestamp) -> Self {
        Self {
            patient_id: document.patient_id,
            session_id: document.session_id,
            snapshot_at,
            stage: document.stage,
            structured_answers: document.structured_answers.clone(),
            completed_sections: document.completed_sections.clone(),
            progress: document.progress,
            messages: document.messages.clone(),
        }
    }
}

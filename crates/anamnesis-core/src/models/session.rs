//! The interview session entity.
//!
//! One session per patient interview. Sessions are mutated exclusively
//! through the engine's serialized merge path and persisted as a
//! [`super::document::SessionDocument`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::message::{Message, Sender};
use super::stage::Stage;

/// Field values extracted or entered for one section.
pub type SectionFields = BTreeMap<String, serde_json::Value>;

/// The full mapping of section identifiers to accumulated field values.
pub type StructuredAnswers = BTreeMap<String, SectionFields>;

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SessionStatus {
    Active,
    Paused,
    Completed,
}

/// The complete state of one patient's in-progress or completed interview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InterviewSession {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub stage: Stage,
    pub current_topic: Option<String>,
    pub structured_answers: StructuredAnswers,
    pub completed_sections: BTreeSet<String>,
    pub status: SessionStatus,
    pub messages: Vec<Message>,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
    /// Accumulated active time. Frozen while paused, never reset.
    pub session_duration_seconds: u64,
    pub last_input_at: jiff::Timestamp,
    /// Monotonic progress floor: the highest percentage reported so far.
    pub progress: u8,
}

impl InterviewSession {
    pub fn new(patient_id: Uuid, now: jiff::Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id,
            stage: Stage::Initial,
            current_topic: None,
            structured_answers: BTreeMap::new(),
            completed_sections: BTreeSet::new(),
            status: SessionStatus::Active,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
            session_duration_seconds: 0,
            last_input_at: now,
            progress: 0,
        }
    }

    /// Deep, per-section merge of extracted fields: new fields are added,
    /// existing fields are overwritten. The section as a whole is never
    /// replaced, so fields absent from `fields` survive.
    pub fn merge_section(&mut self, section_id: &str, fields: &SectionFields) {
        let section = self
            .structured_answers
            .entry(section_id.to_string())
            .or_default();
        for (key, value) in fields {
            section.insert(key.clone(), value.clone());
        }
    }

    /// Append a message. Messages are immutable once appended.
    pub fn push_message(&mut self, message: Message) {
        if message.sender == Sender::User {
            self.last_input_at = message.timestamp;
        }
        self.messages.push(message);
    }

    /// Count of user messages tagged with the given stage. This is the
    /// "answered interactions" figure the progress calculator credits.
    pub fn answered_count_for(&self, stage: Stage) -> usize {
        self.messages
            .iter()
            .filter(|m| m.sender == Sender::User && m.stage_at_creation == stage)
            .count()
    }

    pub fn is_section_completed(&self, section_id: &str) -> bool {
        self.completed_sections.contains(section_id)
    }

    /// Raise the stored progress floor. Progress never regresses, even when
    /// the user navigates back to an earlier completed stage.
    pub fn record_progress(&mut self, computed: u8) -> u8 {
        self.progress = self.progress.max(computed.min(100));
        self.progress
    }

    pub fn touch(&mut self, now: jiff::Timestamp) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> jiff::Timestamp {
        "2025-06-01T10:00:00Z".parse().unwrap()
    }

    #[test]
    fn merge_adds_and_overwrites_without_replacing_section() {
        let mut session = InterviewSession::new(Uuid::new_v4(), now());

        let mut first = SectionFields::new();
        first.insert("hipertension".into(), json!(true));
        first.insert("diabetes".into(), json!(false));
        session.merge_section("antecedentes_personales", &first);

        let mut second = SectionFields::new();
        second.insert("diabetes".into(), json!(true));
        second.insert("asma".into(), json!(true));
        session.merge_section("antecedentes_personales", &second);

        let section = &session.structured_answers["antecedentes_personales"];
        assert_eq!(section["hipertension"], json!(true));
        assert_eq!(section["diabetes"], json!(true));
        assert_eq!(section["asma"], json!(true));
    }

    #[test]
    fn user_messages_advance_last_input() {
        let mut session = InterviewSession::new(Uuid::new_v4(), now());
        let later: jiff::Timestamp = "2025-06-01T10:05:00Z".parse().unwrap();

        session.push_message(Message::new(Sender::Assistant, "hola", later, Stage::Initial));
        assert_eq!(session.last_input_at, now());

        session.push_message(Message::new(Sender::User, "buenos días", later, Stage::Initial));
        assert_eq!(session.last_input_at, later);
    }

    #[test]
    fn progress_floor_never_regresses() {
        let mut session = InterviewSession::new(Uuid::new_v4(), now());
        assert_eq!(session.record_progress(40), 40);
        assert_eq!(session.record_progress(25), 40);
        assert_eq!(session.record_progress(120), 100);
    }
}

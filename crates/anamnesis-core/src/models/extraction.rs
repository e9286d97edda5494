//! Request/response shapes for the external extraction capability.
//!
//! The capability is an AI collaborator: it reads the conversation so far
//! and returns reply messages plus whatever structured data it could
//! extract. Every response field is optional — a malformed or missing
//! field decodes as absent, never as a hard failure.

use serde::{Deserialize, Serialize};

use super::message::{Message, Sender};
use super::profile::DemographicProfile;
use super::session::StructuredAnswers;
use super::stage::Stage;

/// What the engine sends to the extraction capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub prior_messages: Vec<Message>,
    pub structured_answers: StructuredAnswers,
    pub demographic_profile: DemographicProfile,
    pub current_stage: Stage,
}

/// A reply message inside an extraction outcome. The sender defaults to
/// `assistant` when the capability omits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeMessage {
    #[serde(default = "default_sender")]
    pub sender: Sender,
    #[serde(default)]
    pub text: String,
}

fn default_sender() -> Sender {
    Sender::Assistant
}

impl OutcomeMessage {
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
        }
    }
}

/// What the extraction capability returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    #[serde(default)]
    pub messages: Vec<OutcomeMessage>,
    #[serde(default)]
    pub stage_hint: Option<Stage>,
    #[serde(default)]
    pub topic_hint: Option<String>,
    #[serde(default)]
    pub extracted_data: StructuredAnswers,
    #[serde(default)]
    pub error: Option<String>,
}

impl ExtractionOutcome {
    /// A conversational-only outcome: one assistant reply, nothing extracted.
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            messages: vec![OutcomeMessage::assistant(text)],
            ..Self::default()
        }
    }

    /// An outcome representing a failed extraction attempt. Carries the
    /// fallback reply so the conversation stays usable.
    pub fn fallback(text: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            messages: vec![OutcomeMessage::assistant(text)],
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_decodes_with_absent_fields() {
        let outcome: ExtractionOutcome =
            serde_json::from_str(r#"{"messages":[{"text":"hola"}]}"#).unwrap();
        assert_eq!(outcome.messages.len(), 1);
        assert_eq!(outcome.messages[0].sender, Sender::Assistant);
        assert!(outcome.stage_hint.is_none());
        assert!(outcome.extracted_data.is_empty());
        assert!(outcome.error.is_none());
    }

    #[test]
    fn empty_object_is_a_valid_outcome() {
        let outcome: ExtractionOutcome = serde_json::from_str("{}").unwrap();
        assert_eq!(outcome, ExtractionOutcome::default());
    }
}

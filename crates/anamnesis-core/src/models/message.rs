use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::stage::Stage;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Sender {
    User,
    Assistant,
    System,
}

/// A single message in the interview conversation.
///
/// Messages are immutable once appended; ordering is append order. The
/// stage at creation tags each user message for progress accounting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
    pub timestamp: jiff::Timestamp,
    pub stage_at_creation: Stage,
}

impl Message {
    pub fn new(
        sender: Sender,
        text: impl Into<String>,
        timestamp: jiff::Timestamp,
        stage_at_creation: Stage,
    ) -> Self {
        Self {
            sender,
            text: text.into(),
            timestamp,
            stage_at_creation,
        }
    }
}

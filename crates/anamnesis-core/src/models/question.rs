use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The kind of answer a contextual question expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AnswerType {
    Boolean,
    Number,
    Text,
}

/// A follow-up question synthesized from the accumulated answers.
///
/// The id doubles as the structured-answers field key the answer will be
/// stored under, which is how already-answered questions are filtered out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContextualQuestion {
    pub id: String,
    pub section_id: String,
    pub prompt_text: String,
    pub answer_type: AnswerType,
    /// Identifier of the rule that generated this question.
    pub rule_id: String,
}

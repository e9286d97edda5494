//! Interview extraction via the Bedrock Converse API.
//!
//! Sends the conversation so far to a Claude model and decodes the reply
//! into an [`ExtractionOutcome`]. Decoding is deliberately tolerant:
//! a reply that is not valid JSON is treated as a plain conversational
//! message, and any malformed or missing field decodes as absent. The
//! engine's timeout/fallback wrapper handles everything else.

use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, Message as ConverseMessage, SystemContentBlock,
};
use tracing::info;

use anamnesis_core::models::extraction::{ExtractionOutcome, ExtractionRequest};
use anamnesis_core::models::message::Sender;
use anamnesis_engine::capability::ExtractionCapability;
use anamnesis_engine::error::EngineError;

use crate::error::BedrockError;
use crate::prompt::{build_answer_context, build_system_prompt, extract_json_object};

/// The production extraction capability backed by Bedrock.
pub struct BedrockExtractor {
    client: aws_sdk_bedrockruntime::Client,
    model_id: String,
}

impl BedrockExtractor {
    /// The caller chooses the model (e.g. a Claude inference profile).
    pub fn new(config: &aws_config::SdkConfig, model_id: impl Into<String>) -> Self {
        Self {
            client: aws_sdk_bedrockruntime::Client::new(config),
            model_id: model_id.into(),
        }
    }

    async fn converse(&self, request: &ExtractionRequest) -> Result<String, BedrockError> {
        let mut system_prompt = build_system_prompt(request.current_stage, &request.demographic_profile);
        let context = build_answer_context(&request.structured_answers);
        if !context.is_empty() {
            system_prompt.push_str("\n\n");
            system_prompt.push_str(&context);
        }

        let mut converse_messages: Vec<ConverseMessage> = Vec::new();
        for message in &request.prior_messages {
            let role = match message.sender {
                Sender::User => ConversationRole::User,
                // System notices ride along as assistant turns; Converse
                // only accepts the two conversation roles.
                Sender::Assistant | Sender::System => ConversationRole::Assistant,
            };
            let converse_message = ConverseMessage::builder()
                .role(role)
                .content(ContentBlock::Text(message.text.clone()))
                .build()
                .map_err(|e| BedrockError::Invocation(e.to_string()))?;
            converse_messages.push(converse_message);
        }

        info!(
            model_id = %self.model_id,
            stage = ?request.current_stage,
            messages = converse_messages.len(),
            "invoking interview extraction"
        );

        let response = self
            .client
            .converse()
            .model_id(&self.model_id)
            .system(SystemContentBlock::Text(system_prompt))
            .set_messages(Some(converse_messages))
            .send()
            .await
            .map_err(|e| BedrockError::Invocation(e.into_service_error().to_string()))?;

        let output_message = response
            .output()
            .and_then(|o| o.as_message().ok())
            .ok_or_else(|| BedrockError::ResponseParse("no message in response".to_string()))?;

        let response_text = output_message
            .content()
            .iter()
            .filter_map(|block| {
                if let ContentBlock::Text(text) = block {
                    Some(text.as_str())
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");

        Ok(response_text)
    }
}

/// Decode a model reply into an outcome. A reply without a parseable
/// JSON object becomes a plain conversational message.
pub fn parse_outcome(response_text: &str) -> ExtractionOutcome {
    if let Some(body) = extract_json_object(response_text)
        && let Ok(outcome) = serde_json::from_str::<ExtractionOutcome>(body)
    {
        return outcome;
    }
    ExtractionOutcome::reply(response_text.trim())
}

#[async_trait::async_trait]
impl ExtractionCapability for BedrockExtractor {
    async fn extract(&self, request: ExtractionRequest) -> Result<ExtractionOutcome, EngineError> {
        let response_text = self
            .converse(&request)
            .await
            .map_err(|e| EngineError::Extraction(e.to_string()))?;

        let outcome = parse_outcome(&response_text);
        info!(
            replies = outcome.messages.len(),
            extracted_sections = outcome.extracted_data.len(),
            stage_hint = ?outcome.stage_hint,
            "extraction outcome decoded"
        );
        Ok(outcome)
    }
}

//! The external extraction capability seam.
//!
//! The AI collaborator that reads the conversation and returns replies
//! plus extracted structured data. Calls are asynchronous with explicit
//! timeouts; a timeout or error never raises into the conversation —
//! the caller gets a predefined fallback reply and the session stays
//! usable.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use anamnesis_core::models::extraction::{ExtractionOutcome, ExtractionRequest};
use anamnesis_core::models::stage::Stage;

use crate::error::EngineError;

#[async_trait]
pub trait ExtractionCapability: Send + Sync {
    async fn extract(&self, request: ExtractionRequest) -> Result<ExtractionOutcome, EngineError>;
}

/// Per-call timeouts. Lightweight classification calls get a short
/// budget; full question or report generation gets a longer one.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityTimeouts {
    pub classification: Duration,
    pub generation: Duration,
}

impl Default for CapabilityTimeouts {
    fn default() -> Self {
        Self {
            classification: Duration::from_secs(8),
            generation: Duration::from_secs(20),
        }
    }
}

/// The predefined question the assistant falls back to when extraction
/// fails, per stage.
pub fn fallback_prompt(stage: Stage) -> &'static str {
    match stage {
        Stage::Initial => "Cuéntame, ¿qué te trae por aquí hoy?",
        Stage::PersonalInfo => "Sigamos con tus datos. ¿Me confirmas tu edad?",
        Stage::CurrentSymptoms => "¿Puedes contarme un poco más sobre cómo te sientes?",
        Stage::MedicalHistory => {
            "¿Has tenido alguna enfermedad importante o cirugía anteriormente?"
        }
        Stage::FamilyHistory => {
            "¿Hay enfermedades que se repitan en tu familia, como diabetes o hipertensión?"
        }
        Stage::Medications => "¿Estás tomando algún medicamento actualmente?",
        Stage::Lifestyle => "Hablemos de tus hábitos. ¿Haces ejercicio con regularidad?",
        Stage::Summary => "Estamos por terminar. ¿Hay algo más que quieras agregar?",
    }
}

/// Call the capability with a timeout. On timeout or error, returns the
/// stage's fallback outcome instead of failing — the error text rides
/// along in the outcome so the merge records an anomaly and the UI can
/// show a non-blocking notice.
pub async fn extract_with_fallback(
    capability: &dyn ExtractionCapability,
    request: ExtractionRequest,
    timeout: Duration,
) -> ExtractionOutcome {
    let stage = request.current_stage;
    match tokio::time::timeout(timeout, capability.extract(request)).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(error)) => {
            warn!(%error, ?stage, "extraction failed, using fallback");
            ExtractionOutcome::fallback(fallback_prompt(stage), error.to_string())
        }
        Err(_) => {
            warn!(?stage, timeout_ms = timeout.as_millis() as u64, "extraction timed out");
            ExtractionOutcome::fallback(
                fallback_prompt(stage),
                format!("extraction timed out after {}ms", timeout.as_millis()),
            )
        }
    }
}

//! Prompt assembly for the interview extraction calls.
//!
//! Pure string builders: the per-stage system prompt and an XML-style
//! context block carrying the answers accumulated so far plus the
//! patient's demographic band. Keeping these pure keeps them directly
//! testable without AWS.

use anamnesis_core::models::profile::{AgeGroup, DemographicProfile};
use anamnesis_core::models::session::StructuredAnswers;
use anamnesis_core::models::stage::Stage;

const SYSTEM_PROMPT_BASE: &str = "\
Eres el asistente de una entrevista médica conversacional con un paciente. \
Haz una pregunta a la vez, con lenguaje claro y empático. \
Después de cada respuesta del paciente devuelve ÚNICAMENTE un objeto JSON con \
los campos: `messages` (tu respuesta para el paciente), `stage_hint` (etapa \
sugerida, opcional), `topic_hint` (tema detectado, opcional), `extracted_data` \
(datos estructurados por sección, opcional). \
No agregues texto fuera del objeto JSON.";

/// Build the system prompt for a given interview stage.
pub fn build_system_prompt(stage: Stage, profile: &DemographicProfile) -> String {
    let focus = stage_focus(stage);
    let band = match profile.age_group {
        AgeGroup::Infantil => "El paciente es menor de edad; dirígete al acompañante.",
        AgeGroup::Adulto => "El paciente es una persona adulta.",
        AgeGroup::AdultoMayor => {
            "El paciente es una persona mayor: pregunta también por caídas, \
             apoyo en casa y ayudas para moverse."
        }
    };
    format!("{SYSTEM_PROMPT_BASE}\n\nEtapa actual: {focus}\n{band}")
}

fn stage_focus(stage: Stage) -> &'static str {
    match stage {
        Stage::Initial => "saludo inicial y motivo de consulta",
        Stage::PersonalInfo => "datos personales del paciente",
        Stage::CurrentSymptoms => "síntomas actuales: inicio, intensidad, evolución",
        Stage::MedicalHistory => "antecedentes médicos personales",
        Stage::FamilyHistory => "antecedentes familiares",
        Stage::Medications => "medicamentos y tratamientos en curso",
        Stage::Lifestyle => "hábitos y estilo de vida",
        Stage::Summary => "resumen y cierre de la entrevista",
    }
}

/// Build a structured context block from the answers accumulated so far.
///
/// Returns an XML-style block prepended to the system prompt. If there
/// are no answers yet, returns an empty string (no context to inject).
pub fn build_answer_context(answers: &StructuredAnswers) -> String {
    if answers.values().all(|fields| fields.is_empty()) {
        return String::new();
    }

    let mut block = String::from("<datos_registrados>\n");
    for (section_id, fields) in answers {
        if fields.is_empty() {
            continue;
        }
        block.push_str(&format!("<seccion id=\"{section_id}\">\n"));
        for (key, value) in fields {
            block.push_str(&format!("- {key}: {value}\n"));
        }
        block.push_str("</seccion>\n");
    }
    block.push_str("</datos_registrados>");
    block
}

/// Strip Markdown code fences and any surrounding chatter from a model
/// reply, returning the JSON object body if one is present.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

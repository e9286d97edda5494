//! Contextual question synthesis.
//!
//! An ordered rule catalog evaluated against the accumulated answers and
//! the patient's age band. Output ordering is rule priority, then rule
//! insertion order. A question whose id is already answered in the
//! structured answers is never emitted.

use std::collections::BTreeMap;

use anamnesis_core::models::profile::AgeGroup;
use anamnesis_core::models::question::{AnswerType, ContextualQuestion};
use anamnesis_core::models::session::StructuredAnswers;

use crate::answers::{concept_present, is_question_answered, text_contains};

/// One entry in the question-synthesis catalog.
pub trait QuestionRule: Send + Sync {
    /// Unique identifier, recorded on every question this rule emits.
    fn id(&self) -> &'static str;

    /// Lower runs earlier. Ties keep catalog insertion order.
    fn priority(&self) -> u8;

    /// The follow-up questions this rule contributes for the given
    /// answer snapshot, before answered-id filtering.
    fn derive(&self, answers: &StructuredAnswers, age_group: AgeGroup) -> Vec<ContextualQuestion>;
}

/// All registered question rules, in catalog insertion order.
pub fn all_question_rules() -> Vec<Box<dyn QuestionRule>> {
    vec![
        Box::new(PainFollowUp),
        Box::new(MedicationFollowUp),
        Box::new(TobaccoFollowUp),
        Box::new(ElderBaseline),
    ]
}

/// Derive the follow-up questions per section. Pure and idempotent:
/// identical inputs always yield identical output.
pub fn derive_questions(
    answers: &StructuredAnswers,
    age_group: AgeGroup,
) -> BTreeMap<String, Vec<ContextualQuestion>> {
    let mut rules = all_question_rules();
    // Stable: equal priorities keep insertion order.
    rules.sort_by_key(|r| r.priority());

    let mut by_section: BTreeMap<String, Vec<ContextualQuestion>> = BTreeMap::new();
    for rule in &rules {
        for question in rule.derive(answers, age_group) {
            if is_question_answered(answers, &question.id) {
                continue;
            }
            let section = by_section.entry(question.section_id.clone()).or_default();
            if section.iter().all(|q| q.id != question.id) {
                section.push(question);
            }
        }
    }
    by_section
}

fn question(
    rule_id: &str,
    section_id: &str,
    id: &str,
    prompt_text: &str,
    answer_type: AnswerType,
) -> ContextualQuestion {
    ContextualQuestion {
        id: id.to_string(),
        section_id: section_id.to_string(),
        prompt_text: prompt_text.to_string(),
        answer_type,
        rule_id: rule_id.to_string(),
    }
}

// ── Rules ────────────────────────────────────────────────────────────────────

/// A pain-related chief complaint triggers intensity, character, and
/// relief questions.
pub struct PainFollowUp;

const COMPLAINT_KEYS: [&str; 3] = ["motivo_consulta", "sintoma_principal", "chief_complaint"];
const PAIN_MARKERS: [&str; 6] = ["dolor", "duele", "molestia", "ardor", "punzada", "pain"];

impl QuestionRule for PainFollowUp {
    fn id(&self) -> &'static str {
        "dolor_seguimiento"
    }

    fn priority(&self) -> u8 {
        10
    }

    fn derive(&self, answers: &StructuredAnswers, _age_group: AgeGroup) -> Vec<ContextualQuestion> {
        if text_contains(answers, &COMPLAINT_KEYS, &PAIN_MARKERS).is_none() {
            return Vec::new();
        }
        vec![
            question(
                self.id(),
                "sintomas_actuales",
                "dolor_intensidad",
                "Del 1 al 10, ¿qué tan intenso es el dolor?",
                AnswerType::Number,
            ),
            question(
                self.id(),
                "sintomas_actuales",
                "dolor_caracter",
                "¿Cómo describirías el dolor? (punzante, opresivo, ardoroso…)",
                AnswerType::Text,
            ),
            question(
                self.id(),
                "sintomas_actuales",
                "dolor_alivio",
                "¿Hay algo que alivie o empeore el dolor?",
                AnswerType::Text,
            ),
        ]
    }
}

/// Any recorded medication triggers adherence and side-effect questions.
pub struct MedicationFollowUp;

impl QuestionRule for MedicationFollowUp {
    fn id(&self) -> &'static str {
        "medicacion_seguimiento"
    }

    fn priority(&self) -> u8 {
        20
    }

    fn derive(&self, answers: &StructuredAnswers, _age_group: AgeGroup) -> Vec<ContextualQuestion> {
        let has_medication = answers
            .get("medicamentos")
            .is_some_and(|fields| fields.values().any(|v| !v.is_null()));
        if !has_medication {
            return Vec::new();
        }
        vec![
            question(
                self.id(),
                "medicamentos",
                "medicacion_adherencia",
                "¿Tomas tus medicamentos todos los días como fueron indicados?",
                AnswerType::Boolean,
            ),
            question(
                self.id(),
                "medicamentos",
                "medicacion_efectos_secundarios",
                "¿Has notado efectos secundarios con algún medicamento?",
                AnswerType::Text,
            ),
        ]
    }
}

/// Active tobacco use triggers quantity, duration, and cessation-attempt
/// questions.
pub struct TobaccoFollowUp;

const TOBACCO_KEYS: [&str; 4] = ["tabaquismo", "tabaquismo_activo", "fuma", "smoking"];

impl QuestionRule for TobaccoFollowUp {
    fn id(&self) -> &'static str {
        "tabaco_seguimiento"
    }

    fn priority(&self) -> u8 {
        20
    }

    fn derive(&self, answers: &StructuredAnswers, _age_group: AgeGroup) -> Vec<ContextualQuestion> {
        if concept_present(answers, &TOBACCO_KEYS).is_none() {
            return Vec::new();
        }
        vec![
            question(
                self.id(),
                "estilo_vida",
                "tabaco_cantidad",
                "¿Cuántos cigarrillos fumas al día?",
                AnswerType::Number,
            ),
            question(
                self.id(),
                "estilo_vida",
                "tabaco_duracion",
                "¿Desde hace cuántos años fumas?",
                AnswerType::Number,
            ),
            question(
                self.id(),
                "estilo_vida",
                "tabaco_intento_cese",
                "¿Has intentado dejar de fumar?",
                AnswerType::Boolean,
            ),
        ]
    }
}

/// Elder patients always get fall-history, living-alone, and mobility-aid
/// questions appended to the personal-history section, regardless of
/// their answers so far.
pub struct ElderBaseline;

impl QuestionRule for ElderBaseline {
    fn id(&self) -> &'static str {
        "adulto_mayor_base"
    }

    fn priority(&self) -> u8 {
        30
    }

    fn derive(&self, _answers: &StructuredAnswers, age_group: AgeGroup) -> Vec<ContextualQuestion> {
        if age_group != AgeGroup::AdultoMayor {
            return Vec::new();
        }
        vec![
            question(
                self.id(),
                "antecedentes_personales",
                "caidas_ultimo_anio",
                "¿Has sufrido alguna caída en el último año?",
                AnswerType::Boolean,
            ),
            question(
                self.id(),
                "antecedentes_personales",
                "vive_solo",
                "¿Vives solo/a?",
                AnswerType::Boolean,
            ),
            question(
                self.id(),
                "antecedentes_personales",
                "ayuda_movilidad",
                "¿Usas bastón, andador u otra ayuda para moverte?",
                AnswerType::Boolean,
            ),
        ]
    }
}

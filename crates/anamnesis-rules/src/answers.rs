//! Concept lookup over the structured answers.
//!
//! Extraction output keys are model-produced, so each clinical concept is
//! matched against a small synonym list (Spanish primary, English alias)
//! across every section. Matches return the `section.field` path so risk
//! alerts can cite their triggering answers.

use anamnesis_core::models::session::StructuredAnswers;
use serde_json::Value;

/// Field values that count as an affirmative answer.
const AFFIRMATIVE: [&str; 8] = [
    "si",
    "sí",
    "yes",
    "true",
    "positivo",
    "activo",
    "diario",
    "frecuente",
];

/// Whether a field value asserts the concept it is keyed under.
pub fn is_affirmative(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => {
            let normalized = s.trim().to_lowercase();
            AFFIRMATIVE.contains(&normalized.as_str())
        }
        _ => false,
    }
}

/// Find the first affirmative field matching any of the synonym keys, in
/// any section. Returns its `section.field` path.
pub fn concept_present(answers: &StructuredAnswers, keys: &[&str]) -> Option<String> {
    for (section_id, fields) in answers {
        for key in keys {
            if let Some(value) = fields.get(*key)
                && is_affirmative(value)
            {
                return Some(format!("{section_id}.{key}"));
            }
        }
    }
    None
}

/// Find the first text field matching any of the synonym keys whose value
/// contains any of the markers (case-insensitive). Used for free-text
/// fields like the chief complaint.
pub fn text_contains(
    answers: &StructuredAnswers,
    keys: &[&str],
    markers: &[&str],
) -> Option<String> {
    for (section_id, fields) in answers {
        for key in keys {
            if let Some(Value::String(text)) = fields.get(*key) {
                let normalized = text.to_lowercase();
                if markers.iter().any(|m| normalized.contains(m)) {
                    return Some(format!("{section_id}.{key}"));
                }
            }
        }
    }
    None
}

/// Whether a question id already appears as an answered field in any
/// section. Answered means present with any non-null value.
pub fn is_question_answered(answers: &StructuredAnswers, question_id: &str) -> bool {
    answers
        .values()
        .any(|fields| fields.get(question_id).is_some_and(|v| !v.is_null()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn answers_with(section: &str, key: &str, value: Value) -> StructuredAnswers {
        let mut answers = StructuredAnswers::new();
        answers
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value);
        answers
    }

    #[test]
    fn booleans_numbers_and_spanish_strings_are_affirmative() {
        assert!(is_affirmative(&json!(true)));
        assert!(is_affirmative(&json!(1)));
        assert!(is_affirmative(&json!("Sí")));
        assert!(is_affirmative(&json!("activo")));
        assert!(!is_affirmative(&json!(false)));
        assert!(!is_affirmative(&json!(0)));
        assert!(!is_affirmative(&json!("no")));
        assert!(!is_affirmative(&json!("niega")));
        assert!(!is_affirmative(&json!(null)));
    }

    #[test]
    fn concept_matches_any_synonym_and_cites_the_path() {
        let answers = answers_with("antecedentes_personales", "hypertension", json!(true));
        let path = concept_present(&answers, &["hipertension", "hypertension"]);
        assert_eq!(path.as_deref(), Some("antecedentes_personales.hypertension"));
    }

    #[test]
    fn negative_values_do_not_assert_the_concept() {
        let answers = answers_with("antecedentes_personales", "diabetes", json!("no"));
        assert!(concept_present(&answers, &["diabetes"]).is_none());
    }

    #[test]
    fn text_markers_match_case_insensitively() {
        let answers = answers_with(
            "sintomas_actuales",
            "motivo_consulta",
            json!("Dolor de cabeza intenso"),
        );
        let path = text_contains(&answers, &["motivo_consulta"], &["dolor"]);
        assert_eq!(path.as_deref(), Some("sintomas_actuales.motivo_consulta"));
    }

    #[test]
    fn answered_question_ids_are_detected_across_sections() {
        let answers = answers_with("estilo_vida", "tabaco_cantidad", json!(10));
        assert!(is_question_answered(&answers, "tabaco_cantidad"));
        assert!(!is_question_answered(&answers, "tabaco_duracion"));
    }
}

//! Composite risk detection.
//!
//! A fixed-order rule catalog over the structured answers. Each rule is
//! independently testable and pure: the same answer snapshot and age band
//! always produce the same alert list, and every evaluation fully
//! replaces the prior list — alerts are never accumulated.

use anamnesis_core::models::alert::{RiskAlert, RiskType, Severity};
use anamnesis_core::models::profile::AgeGroup;
use anamnesis_core::models::session::StructuredAnswers;

use crate::answers::concept_present;

/// One entry in the risk catalog.
pub trait RiskRule: Send + Sync {
    fn id(&self) -> &'static str;

    /// Evaluate the rule against an answer snapshot. `None` means the
    /// pattern is not present.
    fn evaluate(&self, answers: &StructuredAnswers, age_group: AgeGroup) -> Option<RiskAlert>;
}

/// All registered risk rules, in fixed evaluation order.
pub fn all_risk_rules() -> Vec<Box<dyn RiskRule>> {
    vec![
        Box::new(CardiovascularCluster),
        Box::new(MentalHealthPattern),
        Box::new(GeriatricFallRisk),
    ]
}

/// Evaluate every risk rule in catalog order.
pub fn evaluate_risks(answers: &StructuredAnswers, age_group: AgeGroup) -> Vec<RiskAlert> {
    all_risk_rules()
        .iter()
        .filter_map(|rule| rule.evaluate(answers, age_group))
        .collect()
}

// ── Rules ────────────────────────────────────────────────────────────────────

const HYPERTENSION_KEYS: [&str; 3] = ["hipertension", "hypertension", "hta"];
const DIABETES_KEYS: [&str; 2] = ["diabetes", "dm2"];
const CHOLESTEROL_KEYS: [&str; 4] = [
    "colesterol_alto",
    "colesterol",
    "dislipidemia",
    "high_cholesterol",
];
const SMOKING_KEYS: [&str; 4] = ["tabaquismo", "tabaquismo_activo", "fuma", "smoking"];

/// Any two of hypertension, diabetes, high cholesterol, or active smoking
/// present together.
pub struct CardiovascularCluster;

impl RiskRule for CardiovascularCluster {
    fn id(&self) -> &'static str {
        "riesgo_cardiovascular"
    }

    fn evaluate(&self, answers: &StructuredAnswers, _age_group: AgeGroup) -> Option<RiskAlert> {
        let factors = [
            ("hipertensión", concept_present(answers, &HYPERTENSION_KEYS)),
            ("diabetes", concept_present(answers, &DIABETES_KEYS)),
            ("colesterol alto", concept_present(answers, &CHOLESTEROL_KEYS)),
            ("tabaquismo activo", concept_present(answers, &SMOKING_KEYS)),
        ];

        let present: Vec<(&str, String)> = factors
            .into_iter()
            .filter_map(|(name, path)| path.map(|p| (name, p)))
            .collect();

        if present.len() < 2 {
            return None;
        }

        let names: Vec<&str> = present.iter().map(|(name, _)| *name).collect();
        Some(RiskAlert {
            alert_type: RiskType::Cardiovascular,
            description: format!(
                "Factores de riesgo cardiovascular combinados: {}.",
                names.join(", ")
            ),
            severity: Severity::High,
            recommendation: None,
            triggering_fields: present.into_iter().map(|(_, path)| path).collect(),
        })
    }
}

const POOR_SLEEP_KEYS: [&str; 4] = ["insomnio", "mal_sueno", "mala_calidad_sueno", "insomnia"];
const ANXIETY_KEYS: [&str; 2] = ["ansiedad", "anxiety"];
const DEPRESSION_KEYS: [&str; 3] = ["depresion", "animo_deprimido", "depression"];

/// Poor sleep together with an anxiety indicator, or a depression
/// indicator on its own.
pub struct MentalHealthPattern;

impl RiskRule for MentalHealthPattern {
    fn id(&self) -> &'static str {
        "riesgo_salud_mental"
    }

    fn evaluate(&self, answers: &StructuredAnswers, _age_group: AgeGroup) -> Option<RiskAlert> {
        let sleep = concept_present(answers, &POOR_SLEEP_KEYS);
        let anxiety = concept_present(answers, &ANXIETY_KEYS);
        let depression = concept_present(answers, &DEPRESSION_KEYS);

        let mut triggering = Vec::new();
        let mut matched = false;

        if let (Some(sleep_path), Some(anxiety_path)) = (&sleep, &anxiety) {
            triggering.push(sleep_path.clone());
            triggering.push(anxiety_path.clone());
            matched = true;
        }
        if let Some(depression_path) = &depression {
            triggering.push(depression_path.clone());
            matched = true;
        }

        if !matched {
            return None;
        }

        Some(RiskAlert {
            alert_type: RiskType::MentalHealth,
            description: "Indicadores de malestar emocional en las respuestas.".to_string(),
            severity: Severity::Medium,
            recommendation: Some(
                "Considerar una evaluación de salud mental con un profesional.".to_string(),
            ),
            triggering_fields: triggering,
        })
    }
}

const FALLS_KEYS: [&str; 2] = ["caidas_ultimo_anio", "caidas"];
const LIVES_ALONE_KEYS: [&str; 2] = ["vive_solo", "lives_alone"];

/// Elder patient with falls in the last year who lives alone.
pub struct GeriatricFallRisk;

impl RiskRule for GeriatricFallRisk {
    fn id(&self) -> &'static str {
        "riesgo_geriatrico"
    }

    fn evaluate(&self, answers: &StructuredAnswers, age_group: AgeGroup) -> Option<RiskAlert> {
        if age_group != AgeGroup::AdultoMayor {
            return None;
        }

        let falls = concept_present(answers, &FALLS_KEYS)?;
        let lives_alone = concept_present(answers, &LIVES_ALONE_KEYS)?;

        Some(RiskAlert {
            alert_type: RiskType::Geriatric,
            description: "Caídas recientes en una persona mayor que vive sola.".to_string(),
            severity: Severity::High,
            recommendation: Some(
                "Evaluar riesgo de caídas y seguridad del hogar.".to_string(),
            ),
            triggering_fields: vec![falls, lives_alone],
        })
    }
}

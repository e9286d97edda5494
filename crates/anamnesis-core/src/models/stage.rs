//! Interview stages.
//!
//! The interview walks a fixed, ordered sequence of stages. Each stage
//! carries a completion weight; the weights sum to 100 so that progress
//! can be expressed directly as a percentage.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One ordered phase of the interview, carrying a fixed completion weight.
///
/// The declaration order is the interview order. `Summary` is terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Stage {
    Initial,
    PersonalInfo,
    CurrentSymptoms,
    MedicalHistory,
    FamilyHistory,
    Medications,
    Lifestyle,
    Summary,
}

/// Section identifiers for the content-bearing stages. `Initial` and
/// `Summary` carry no section of their own.
pub const SECTION_UNIVERSE: [&str; 6] = [
    "datos_personales",
    "sintomas_actuales",
    "antecedentes_personales",
    "antecedentes_familiares",
    "medicamentos",
    "estilo_vida",
];

impl Stage {
    /// All stages in interview order.
    pub const ALL: [Stage; 8] = [
        Stage::Initial,
        Stage::PersonalInfo,
        Stage::CurrentSymptoms,
        Stage::MedicalHistory,
        Stage::FamilyHistory,
        Stage::Medications,
        Stage::Lifestyle,
        Stage::Summary,
    ];

    /// Fixed completion weight. The weights across all stages sum to 100.
    pub fn weight(&self) -> u8 {
        match self {
            Stage::Initial => 5,
            Stage::PersonalInfo => 15,
            Stage::CurrentSymptoms => 20,
            Stage::MedicalHistory => 20,
            Stage::FamilyHistory => 10,
            Stage::Medications => 10,
            Stage::Lifestyle => 15,
            Stage::Summary => 5,
        }
    }

    /// Position in the interview order.
    pub fn index(&self) -> usize {
        Stage::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    /// The next stage in interview order, or `None` at `Summary`.
    pub fn next(&self) -> Option<Stage> {
        Stage::ALL.get(self.index() + 1).copied()
    }

    pub fn is_terminal(&self) -> bool {
        *self == Stage::Summary
    }

    /// The structured-answers section this stage fills, if any.
    pub fn section_id(&self) -> Option<&'static str> {
        match self {
            Stage::Initial | Stage::Summary => None,
            Stage::PersonalInfo => Some("datos_personales"),
            Stage::CurrentSymptoms => Some("sintomas_actuales"),
            Stage::MedicalHistory => Some("antecedentes_personales"),
            Stage::FamilyHistory => Some("antecedentes_familiares"),
            Stage::Medications => Some("medicamentos"),
            Stage::Lifestyle => Some("estilo_vida"),
        }
    }

    /// Look up the stage that owns a section identifier.
    pub fn from_section_id(section_id: &str) -> Option<Stage> {
        Stage::ALL
            .iter()
            .find(|s| s.section_id() == Some(section_id))
            .copied()
    }

    /// Fixed topic → stage lookup used when the extraction step returns a
    /// topic but no explicit stage hint. Accepts the Spanish topic labels
    /// the model produces plus their English aliases.
    pub fn from_topic(topic: &str) -> Option<Stage> {
        match topic.trim().to_lowercase().as_str() {
            "inicio" | "saludo" | "initial" => Some(Stage::Initial),
            "datos_personales" | "identificacion" | "personal" | "personal_info" => {
                Some(Stage::PersonalInfo)
            }
            "sintomas" | "sintomas_actuales" | "motivo_consulta" | "symptoms" => {
                Some(Stage::CurrentSymptoms)
            }
            "antecedentes" | "antecedentes_personales" | "enfermedades_previas"
            | "medical_history" => Some(Stage::MedicalHistory),
            "antecedentes_familiares" | "familia" | "family_history" => {
                Some(Stage::FamilyHistory)
            }
            "medicamentos" | "medicacion" | "tratamiento" | "medications" => {
                Some(Stage::Medications)
            }
            "estilo_vida" | "habitos" | "lifestyle" => Some(Stage::Lifestyle),
            "resumen" | "cierre" | "summary" => Some(Stage::Summary),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_100() {
        let total: u32 = Stage::ALL.iter().map(|s| s.weight() as u32).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn declaration_order_is_interview_order() {
        assert!(Stage::Initial < Stage::PersonalInfo);
        assert!(Stage::Lifestyle < Stage::Summary);
        assert_eq!(Stage::Initial.next(), Some(Stage::PersonalInfo));
        assert_eq!(Stage::Summary.next(), None);
    }

    #[test]
    fn every_content_stage_has_a_section_in_the_universe() {
        for stage in Stage::ALL {
            if let Some(section) = stage.section_id() {
                assert!(SECTION_UNIVERSE.contains(&section));
                assert_eq!(Stage::from_section_id(section), Some(stage));
            }
        }
    }

    #[test]
    fn topic_lookup_accepts_spanish_and_english() {
        assert_eq!(Stage::from_topic("medicamentos"), Some(Stage::Medications));
        assert_eq!(Stage::from_topic("Medications"), Some(Stage::Medications));
        assert_eq!(Stage::from_topic("  SINTOMAS "), Some(Stage::CurrentSymptoms));
        assert_eq!(Stage::from_topic("astrologia"), None);
    }

    #[test]
    fn wire_names_are_screaming_snake() {
        let json = serde_json::to_string(&Stage::PersonalInfo).unwrap();
        assert_eq!(json, "\"PERSONAL_INFO\"");
        let back: Stage = serde_json::from_str("\"CURRENT_SYMPTOMS\"").unwrap();
        assert_eq!(back, Stage::CurrentSymptoms);
    }
}

use anamnesis_core::models::alert::{RiskType, Severity};
use anamnesis_core::models::profile::AgeGroup;
use anamnesis_core::models::session::StructuredAnswers;
use anamnesis_rules::evaluate_risks;
use serde_json::json;

fn insert(answers: &mut StructuredAnswers, section: &str, key: &str, value: serde_json::Value) {
    answers
        .entry(section.to_string())
        .or_default()
        .insert(key.to_string(), value);
}

#[test]
fn hypertension_plus_diabetes_is_one_high_cardiovascular_alert() {
    let mut answers = StructuredAnswers::new();
    insert(&mut answers, "antecedentes_personales", "hipertension", json!(true));
    insert(&mut answers, "antecedentes_personales", "diabetes", json!(true));

    let alerts = evaluate_risks(&answers, AgeGroup::Adulto);

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, RiskType::Cardiovascular);
    assert_eq!(alerts[0].severity, Severity::High);
    assert_eq!(alerts[0].triggering_fields.len(), 2);
}

#[test]
fn a_single_cardiovascular_factor_is_not_enough() {
    let mut answers = StructuredAnswers::new();
    insert(&mut answers, "antecedentes_personales", "hipertension", json!(true));

    assert!(evaluate_risks(&answers, AgeGroup::Adulto).is_empty());
}

#[test]
fn english_alias_keys_count_toward_the_cluster() {
    let mut answers = StructuredAnswers::new();
    insert(&mut answers, "antecedentes_personales", "hypertension", json!(true));
    insert(&mut answers, "estilo_vida", "smoking", json!("activo"));

    let alerts = evaluate_risks(&answers, AgeGroup::Adulto);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, RiskType::Cardiovascular);
}

#[test]
fn elder_with_falls_living_alone_gets_geriatric_alert_with_recommendation() {
    let mut answers = StructuredAnswers::new();
    insert(&mut answers, "antecedentes_personales", "caidas_ultimo_anio", json!(true));
    insert(&mut answers, "antecedentes_personales", "vive_solo", json!(true));

    let alerts = evaluate_risks(&answers, AgeGroup::AdultoMayor);

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, RiskType::Geriatric);
    assert_eq!(alerts[0].severity, Severity::High);
    assert!(alerts[0].recommendation.is_some());
}

#[test]
fn geriatric_rule_requires_the_elder_band() {
    let mut answers = StructuredAnswers::new();
    insert(&mut answers, "antecedentes_personales", "caidas_ultimo_anio", json!(true));
    insert(&mut answers, "antecedentes_personales", "vive_solo", json!(true));

    assert!(evaluate_risks(&answers, AgeGroup::Adulto).is_empty());
}

#[test]
fn depression_alone_triggers_the_mental_health_rule() {
    let mut answers = StructuredAnswers::new();
    insert(&mut answers, "antecedentes_personales", "depresion", json!(true));

    let alerts = evaluate_risks(&answers, AgeGroup::Adulto);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, RiskType::MentalHealth);
    assert_eq!(alerts[0].severity, Severity::Medium);
    assert!(alerts[0].recommendation.is_some());
}

#[test]
fn poor_sleep_needs_anxiety_to_trigger() {
    let mut answers = StructuredAnswers::new();
    insert(&mut answers, "estilo_vida", "insomnio", json!(true));
    assert!(evaluate_risks(&answers, AgeGroup::Adulto).is_empty());

    insert(&mut answers, "sintomas_actuales", "ansiedad", json!(true));
    let alerts = evaluate_risks(&answers, AgeGroup::Adulto);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, RiskType::MentalHealth);
}

#[test]
fn evaluation_is_pure_and_ordered() {
    let mut answers = StructuredAnswers::new();
    insert(&mut answers, "antecedentes_personales", "hipertension", json!(true));
    insert(&mut answers, "antecedentes_personales", "diabetes", json!(true));
    insert(&mut answers, "antecedentes_personales", "depresion", json!(true));
    insert(&mut answers, "antecedentes_personales", "caidas_ultimo_anio", json!(true));
    insert(&mut answers, "antecedentes_personales", "vive_solo", json!(true));

    let first = evaluate_risks(&answers, AgeGroup::AdultoMayor);
    let second = evaluate_risks(&answers, AgeGroup::AdultoMayor);

    assert_eq!(first, second);
    let types: Vec<RiskType> = first.iter().map(|a| a.alert_type).collect();
    assert_eq!(
        types,
        vec![RiskType::Cardiovascular, RiskType::MentalHealth, RiskType::Geriatric]
    );
}

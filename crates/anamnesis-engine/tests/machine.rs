//! State-machine behavior: merge semantics, transition rules, navigation.

mod common;

use std::collections::BTreeMap;

use serde_json::json;
use uuid::Uuid;

use anamnesis_core::models::extraction::{ExtractionOutcome, OutcomeMessage};
use anamnesis_core::models::message::Sender;
use anamnesis_core::models::profile::AgeGroup;
use anamnesis_core::models::session::InterviewSession;
use anamnesis_core::models::stage::{SECTION_UNIVERSE, Stage};
use anamnesis_engine::anomaly::AnomalyKind;
use anamnesis_engine::error::EngineError;
use anamnesis_engine::machine::{apply_extraction, navigate};

use common::start_time;

fn session() -> InterviewSession {
    InterviewSession::new(Uuid::new_v4(), start_time())
}

fn outcome_with_data(section: &str, key: &str, value: serde_json::Value) -> ExtractionOutcome {
    let mut fields = BTreeMap::new();
    fields.insert(key.to_string(), value);
    let mut extracted = BTreeMap::new();
    extracted.insert(section.to_string(), fields);
    ExtractionOutcome {
        extracted_data: extracted,
        ..ExtractionOutcome::default()
    }
}

#[test]
fn stage_hint_advances_forward_and_completes_passed_sections() {
    let mut session = session();
    session.stage = Stage::PersonalInfo;

    let outcome = ExtractionOutcome {
        stage_hint: Some(Stage::MedicalHistory),
        ..ExtractionOutcome::default()
    };
    let report = apply_extraction(&mut session, &outcome, AgeGroup::Adulto, start_time());

    assert_eq!(session.stage, Stage::MedicalHistory);
    assert_eq!(
        report.transition,
        Some((Stage::PersonalInfo, Stage::MedicalHistory))
    );
    assert!(session.is_section_completed("datos_personales"));
    assert!(session.is_section_completed("sintomas_actuales"));
    assert!(!session.is_section_completed("antecedentes_personales"));
    assert_eq!(
        report.newly_completed,
        vec!["datos_personales".to_string(), "sintomas_actuales".to_string()]
    );
}

#[test]
fn backward_hint_is_rejected_with_an_anomaly() {
    let mut session = session();
    session.stage = Stage::Medications;

    let outcome = ExtractionOutcome {
        stage_hint: Some(Stage::PersonalInfo),
        ..ExtractionOutcome::default()
    };
    let report = apply_extraction(&mut session, &outcome, AgeGroup::Adulto, start_time());

    assert_eq!(session.stage, Stage::Medications);
    assert!(report.transition.is_none());
    assert_eq!(report.anomalies.len(), 1);
    assert_eq!(report.anomalies[0].kind, AnomalyKind::BackwardHint);
}

#[test]
fn topic_hint_is_used_when_no_stage_hint_is_present() {
    let mut session = session();
    session.stage = Stage::CurrentSymptoms;

    let outcome = ExtractionOutcome {
        topic_hint: Some("medicamentos".to_string()),
        ..ExtractionOutcome::default()
    };
    apply_extraction(&mut session, &outcome, AgeGroup::Adulto, start_time());

    assert_eq!(session.stage, Stage::Medications);
    assert_eq!(session.current_topic.as_deref(), Some("medicamentos"));
}

#[test]
fn unknown_topic_leaves_stage_unchanged_and_records_anomaly() {
    let mut session = session();
    session.stage = Stage::CurrentSymptoms;

    let outcome = ExtractionOutcome {
        topic_hint: Some("numerologia".to_string()),
        ..ExtractionOutcome::default()
    };
    let report = apply_extraction(&mut session, &outcome, AgeGroup::Adulto, start_time());

    assert_eq!(session.stage, Stage::CurrentSymptoms);
    assert!(report.transition.is_none());
    assert_eq!(report.anomalies.len(), 1);
    assert_eq!(report.anomalies[0].kind, AnomalyKind::UnknownTopic);
    assert!(session.current_topic.is_none());
}

#[test]
fn extracted_data_merges_without_replacing_sections() {
    let mut session = session();
    session.stage = Stage::MedicalHistory;

    apply_extraction(
        &mut session,
        &outcome_with_data("antecedentes_personales", "hipertension", json!(true)),
        AgeGroup::Adulto,
        start_time(),
    );
    apply_extraction(
        &mut session,
        &outcome_with_data("antecedentes_personales", "diabetes", json!(true)),
        AgeGroup::Adulto,
        start_time(),
    );

    let section = &session.structured_answers["antecedentes_personales"];
    assert_eq!(section["hipertension"], json!(true));
    assert_eq!(section["diabetes"], json!(true));
}

#[test]
fn merge_rescans_risks_and_fully_replaces_the_list() {
    let mut session = session();
    session.stage = Stage::MedicalHistory;

    let first = apply_extraction(
        &mut session,
        &outcome_with_data("antecedentes_personales", "hipertension", json!(true)),
        AgeGroup::Adulto,
        start_time(),
    );
    assert!(first.alerts.is_empty());

    let second = apply_extraction(
        &mut session,
        &outcome_with_data("antecedentes_personales", "diabetes", json!(true)),
        AgeGroup::Adulto,
        start_time(),
    );
    assert_eq!(second.alerts.len(), 1);
}

#[test]
fn sections_outside_the_universe_are_skipped_with_anomaly() {
    let mut session = session();

    let report = apply_extraction(
        &mut session,
        &outcome_with_data("astrologia", "signo", json!("piscis")),
        AgeGroup::Adulto,
        start_time(),
    );

    assert!(session.structured_answers.is_empty());
    assert_eq!(report.anomalies.len(), 1);
    assert_eq!(report.anomalies[0].kind, AnomalyKind::UnknownSection);
    for section in session.completed_sections.iter() {
        assert!(SECTION_UNIVERSE.contains(&section.as_str()));
    }
}

#[test]
fn reply_messages_are_tagged_with_the_pre_transition_stage() {
    let mut session = session();
    session.stage = Stage::PersonalInfo;

    let outcome = ExtractionOutcome {
        messages: vec![OutcomeMessage::assistant("¿Qué síntomas tienes?")],
        stage_hint: Some(Stage::CurrentSymptoms),
        ..ExtractionOutcome::default()
    };
    apply_extraction(&mut session, &outcome, AgeGroup::Adulto, start_time());

    let last = session.messages.last().unwrap();
    assert_eq!(last.sender, Sender::Assistant);
    assert_eq!(last.stage_at_creation, Stage::PersonalInfo);
    assert_eq!(session.stage, Stage::CurrentSymptoms);
}

#[test]
fn extraction_error_records_anomaly_but_keeps_session_consistent() {
    let mut session = session();
    let before = session.structured_answers.clone();

    let outcome = ExtractionOutcome::fallback("¿Seguimos?", "model timeout");
    let report = apply_extraction(&mut session, &outcome, AgeGroup::Adulto, start_time());

    assert_eq!(report.anomalies[0].kind, AnomalyKind::ExtractionError);
    assert_eq!(session.structured_answers, before);
    // The fallback reply still lands in the conversation.
    assert_eq!(session.messages.len(), 1);
}

#[test]
fn navigation_back_requires_a_completed_section() {
    let mut session = session();
    session.stage = Stage::MedicalHistory;

    // Family history was never completed — jumping ahead is rejected.
    let err = navigate(&mut session, Stage::FamilyHistory, start_time()).unwrap_err();
    assert!(matches!(err, EngineError::State(_)));
    assert_eq!(session.stage, Stage::MedicalHistory);

    // A completed earlier section can be revisited.
    session
        .completed_sections
        .insert("datos_personales".to_string());
    let transition = navigate(&mut session, Stage::PersonalInfo, start_time()).unwrap();
    assert_eq!(transition, Some((Stage::MedicalHistory, Stage::PersonalInfo)));
    assert_eq!(session.stage, Stage::PersonalInfo);
}

#[test]
fn progress_floor_survives_backward_navigation() {
    let mut session = session();
    session.stage = Stage::PersonalInfo;

    let outcome = ExtractionOutcome {
        stage_hint: Some(Stage::FamilyHistory),
        ..ExtractionOutcome::default()
    };
    let report = apply_extraction(&mut session, &outcome, AgeGroup::Adulto, start_time());
    let progress_before = report.progress;
    assert_eq!(progress_before, 60); // 5 + 15 + 20 + 20

    navigate(&mut session, Stage::PersonalInfo, start_time()).unwrap();
    let replay = apply_extraction(
        &mut session,
        &ExtractionOutcome::default(),
        AgeGroup::Adulto,
        start_time(),
    );
    assert_eq!(replay.progress, progress_before);
}

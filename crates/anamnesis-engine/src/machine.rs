//! The interview state machine.
//!
//! Pure transition functions over [`InterviewSession`]. The stage only
//! advances forward through the fixed order; the only way back is
//! explicit navigation to a stage whose section is already completed.
//! Unrecognized hints and topics never fail the merge — they record an
//! anomaly and leave the stage unchanged.

use jiff::Timestamp;

use anamnesis_core::models::alert::RiskAlert;
use anamnesis_core::models::extraction::ExtractionOutcome;
use anamnesis_core::models::message::Message;
use anamnesis_core::models::profile::AgeGroup;
use anamnesis_core::models::session::{InterviewSession, SessionStatus};
use anamnesis_core::models::stage::{SECTION_UNIVERSE, Stage};
use anamnesis_core::progress::compute_progress;
use anamnesis_rules::evaluate_risks;

use crate::anomaly::{Anomaly, AnomalyKind};
use crate::error::EngineError;

/// What one application of an extraction result did to the session.
#[derive(Debug, Clone)]
pub struct ApplyReport {
    pub transition: Option<(Stage, Stage)>,
    /// Sections newly marked completed by this merge. Non-empty means the
    /// caller owes a forced persistence write.
    pub newly_completed: Vec<String>,
    pub progress: u8,
    /// Full replacement list from re-scanning the risk rules.
    pub alerts: Vec<RiskAlert>,
    pub anomalies: Vec<Anomaly>,
}

/// Merge an extraction result into the session and evaluate the
/// transition rules. Deterministic: the same session, outcome, and
/// timestamp always produce the same result.
pub fn apply_extraction(
    session: &mut InterviewSession,
    outcome: &ExtractionOutcome,
    age_group: AgeGroup,
    now: Timestamp,
) -> ApplyReport {
    let mut anomalies = Vec::new();

    if let Some(error) = &outcome.error {
        anomalies.push(Anomaly::new(
            AnomalyKind::ExtractionError,
            error.clone(),
            session.stage,
            now,
        ));
    }

    // Reply messages are tagged with the stage that was current when they
    // arrived, before any transition below.
    for reply in &outcome.messages {
        session.push_message(Message::new(
            reply.sender,
            reply.text.clone(),
            now,
            session.stage,
        ));
    }

    // Deep per-section merge. Sections outside the fixed universe are
    // skipped, not failed.
    for (section_id, fields) in &outcome.extracted_data {
        if SECTION_UNIVERSE.contains(&section_id.as_str()) {
            session.merge_section(section_id, fields);
        } else {
            anomalies.push(Anomaly::new(
                AnomalyKind::UnknownSection,
                section_id.clone(),
                session.stage,
                now,
            ));
        }
    }

    let transition = resolve_transition(session, outcome, now, &mut anomalies);
    let newly_completed = match transition {
        Some((from, to)) => advance(session, from, to),
        None => Vec::new(),
    };

    session.touch(now);
    let progress = session.record_progress(compute_progress(session));
    let alerts = evaluate_risks(&session.structured_answers, age_group);

    ApplyReport {
        transition,
        newly_completed,
        progress,
        alerts,
        anomalies,
    }
}

/// Decide the target stage from the extraction outcome: an explicit stage
/// hint wins; otherwise the topic hint goes through the fixed lookup
/// table. Backward targets are rejected — only explicit navigation may
/// move back.
fn resolve_transition(
    session: &mut InterviewSession,
    outcome: &ExtractionOutcome,
    now: Timestamp,
    anomalies: &mut Vec<Anomaly>,
) -> Option<(Stage, Stage)> {
    let current = session.stage;

    let target = if let Some(hint) = outcome.stage_hint {
        Some(hint)
    } else if let Some(topic) = &outcome.topic_hint {
        match Stage::from_topic(topic) {
            Some(stage) => {
                session.current_topic = Some(topic.clone());
                Some(stage)
            }
            None => {
                anomalies.push(Anomaly::new(
                    AnomalyKind::UnknownTopic,
                    topic.clone(),
                    current,
                    now,
                ));
                None
            }
        }
    } else {
        None
    };

    match target {
        Some(stage) if stage == current => None,
        Some(stage) if stage > current => Some((current, stage)),
        Some(stage) => {
            anomalies.push(Anomaly::new(
                AnomalyKind::BackwardHint,
                format!("{:?} -> {:?}", current, stage),
                current,
                now,
            ));
            None
        }
        None => None,
    }
}

/// Move the stage forward, marking the sections of every stage passed
/// over (the departed stage included) as completed.
fn advance(session: &mut InterviewSession, from: Stage, to: Stage) -> Vec<String> {
    let mut newly_completed = Vec::new();
    for stage in &Stage::ALL[from.index()..to.index()] {
        if let Some(section) = stage.section_id()
            && session.completed_sections.insert(section.to_string())
        {
            newly_completed.push(section.to_string());
        }
    }
    session.stage = to;
    newly_completed
}

/// Explicit user navigation: permitted only to the current stage or to a
/// stage whose section is already completed.
pub fn navigate(
    session: &mut InterviewSession,
    target: Stage,
    now: Timestamp,
) -> Result<Option<(Stage, Stage)>, EngineError> {
    let current = session.stage;
    if target == current {
        return Ok(None);
    }

    let permitted = target
        .section_id()
        .is_some_and(|section| session.is_section_completed(section));
    if !permitted {
        return Err(EngineError::State(format!(
            "navigation to {target:?} requires its section to be completed"
        )));
    }

    session.stage = target;
    session.touch(now);
    Ok(Some((current, target)))
}

/// Pause the session, freezing the duration counter.
pub fn pause(session: &mut InterviewSession, now: Timestamp) {
    if session.status == SessionStatus::Active {
        session.status = SessionStatus::Paused;
        session.touch(now);
    }
}

/// Resume a paused session. The duration counter continues from its
/// stored value — it is never reset.
pub fn resume(session: &mut InterviewSession, now: Timestamp) {
    if session.status == SessionStatus::Paused {
        session.status = SessionStatus::Active;
        session.last_input_at = now;
        session.touch(now);
    }
}

/// Finish the interview: advance to `Summary`, complete the remaining
/// sections, and mark the session completed at full progress.
pub fn complete(session: &mut InterviewSession, now: Timestamp) -> Vec<String> {
    let newly_completed = if session.stage.is_terminal() {
        Vec::new()
    } else {
        advance(session, session.stage, Stage::Summary)
    };
    session.status = SessionStatus::Completed;
    session.record_progress(100);
    session.touch(now);
    newly_completed
}

//! The interview engine handle.
//!
//! Owns the session behind a single `tokio::sync::Mutex` so that all
//! merges — extraction results, manual answers, navigation — pass through
//! one serialized mutation path and answers, stage, and progress update
//! atomically. Observers subscribe to a broadcast channel instead of
//! sharing the session.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};
use tracing::info;

use anamnesis_core::models::engagement::{EngagementNotification, NotificationKind};
use anamnesis_core::models::extraction::{ExtractionOutcome, ExtractionRequest};
use anamnesis_core::models::message::{Message, Sender};
use anamnesis_core::models::profile::DemographicProfile;
use anamnesis_core::models::question::ContextualQuestion;
use anamnesis_core::models::session::{InterviewSession, SessionStatus};
use anamnesis_core::models::stage::{SECTION_UNIVERSE, Stage};
use anamnesis_core::progress::compute_progress;
use anamnesis_rules::{derive_questions, evaluate_risks};

use crate::anomaly::{Anomaly, AnomalyKind};
use crate::capability::{CapabilityTimeouts, ExtractionCapability, extract_with_fallback};
use crate::clock::Clock;
use crate::engagement::{EngagementMonitor, NotificationPolicy};
use crate::error::EngineError;
use crate::events::EngineEvent;
use crate::machine::{self, ApplyReport};
use crate::persist::{PersistenceCoordinator, Recovered, RecoverySource};

const EVENT_CHANNEL_CAPACITY: usize = 64;

struct EngineState {
    session: InterviewSession,
    monitor: EngagementMonitor,
}

pub struct InterviewEngine {
    state: Mutex<EngineState>,
    profile: DemographicProfile,
    clock: Arc<dyn Clock>,
    policy: Arc<dyn NotificationPolicy>,
    coordinator: Arc<PersistenceCoordinator>,
    timeouts: CapabilityTimeouts,
    events: broadcast::Sender<EngineEvent>,
}

impl InterviewEngine {
    pub fn new(
        session: InterviewSession,
        profile: DemographicProfile,
        clock: Arc<dyn Clock>,
        policy: Arc<dyn NotificationPolicy>,
        coordinator: Arc<PersistenceCoordinator>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        info!(
            session_id = %session.id,
            ruleset = anamnesis_rules::RULESET_VERSION,
            "interview engine initialized"
        );
        Self {
            state: Mutex::new(EngineState {
                session,
                monitor: EngagementMonitor::default(),
            }),
            profile,
            clock,
            policy,
            coordinator,
            timeouts: CapabilityTimeouts::default(),
            events,
        }
    }

    /// Override the extraction-call timeouts.
    pub fn with_timeouts(mut self, timeouts: CapabilityTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Recover the patient's session from the persistence tiers (or start
    /// a fresh one) and build an engine around it.
    pub async fn recover(
        patient_id: uuid::Uuid,
        profile: DemographicProfile,
        clock: Arc<dyn Clock>,
        policy: Arc<dyn NotificationPolicy>,
        coordinator: Arc<PersistenceCoordinator>,
    ) -> Result<(Self, RecoverySource), EngineError> {
        let Recovered { session, source } = coordinator.recover(patient_id).await?;
        Ok((
            Self::new(session, profile, clock, policy, coordinator),
            source,
        ))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> InterviewSession {
        self.state.lock().await.session.clone()
    }

    /// The follow-up questions currently owed, per section.
    pub async fn pending_questions(&self) -> BTreeMap<String, Vec<ContextualQuestion>> {
        let state = self.state.lock().await;
        derive_questions(&state.session.structured_answers, self.profile.age_group)
    }

    /// Drive one user input through the full flow: append the message,
    /// call the extraction capability (with timeout and fallback), and
    /// merge the outcome.
    pub async fn handle_user_input(
        &self,
        capability: &dyn ExtractionCapability,
        text: impl Into<String>,
    ) -> Result<ApplyReport, EngineError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(EngineError::Validation("empty input".to_string()));
        }

        // Append the user message and release the lock before the
        // capability call — extraction must not block other merges.
        let (request, session) = {
            let mut state = self.state.lock().await;
            let now = self.clock.now();
            let stage = state.session.stage;
            state
                .session
                .push_message(Message::new(Sender::User, text, now, stage));
            state.session.touch(now);
            let progress = state
                .session
                .record_progress(compute_progress(&state.session));
            let _ = self.events.send(EngineEvent::ProgressUpdated { progress });

            let request = ExtractionRequest {
                prior_messages: state.session.messages.clone(),
                structured_answers: state.session.structured_answers.clone(),
                demographic_profile: self.profile.clone(),
                current_stage: stage,
            };
            (request, state.session.clone())
        };
        self.coordinator.cache_write(&session).await;

        let outcome =
            extract_with_fallback(capability, request, self.timeouts.generation).await;
        self.apply_extraction(outcome).await
    }

    /// Merge an extraction outcome through the state machine.
    pub async fn apply_extraction(
        &self,
        outcome: ExtractionOutcome,
    ) -> Result<ApplyReport, EngineError> {
        let (report, session) = {
            let mut state = self.state.lock().await;
            let now = self.clock.now();
            let report = machine::apply_extraction(
                &mut state.session,
                &outcome,
                self.profile.age_group,
                now,
            );
            (report, state.session.clone())
        };

        self.publish_report(&report);
        self.coordinator.cache_write(&session).await;

        if report.newly_completed.is_empty() {
            self.coordinator.autosave(&session).await;
        } else if let Err(error) = self.coordinator.force_save(&session).await {
            // Stage completion forces a write, but a failure must not
            // block the conversation: the cache is current and the retry
            // flag is set.
            Anomaly::new(
                AnomalyKind::PersistenceRetry,
                error.to_string(),
                session.stage,
                self.clock.now(),
            )
            .emit();
        }

        Ok(report)
    }

    /// Merge one manually entered answer. Rejected before the merge if
    /// the section or field is malformed — the session is unaffected.
    pub async fn submit_answer(
        &self,
        section_id: &str,
        field: &str,
        value: serde_json::Value,
    ) -> Result<(), EngineError> {
        if !SECTION_UNIVERSE.contains(&section_id) {
            return Err(EngineError::Validation(format!(
                "unknown section: {section_id}"
            )));
        }
        if field.trim().is_empty() {
            return Err(EngineError::Validation("empty field name".to_string()));
        }
        if value.is_null() {
            return Err(EngineError::Validation(format!(
                "null value for field: {field}"
            )));
        }

        let session = {
            let mut state = self.state.lock().await;
            let now = self.clock.now();
            let mut fields = BTreeMap::new();
            fields.insert(field.to_string(), value);
            state.session.merge_section(section_id, &fields);
            state.session.last_input_at = now;
            state.session.touch(now);
            state.session.clone()
        };

        let alerts = evaluate_risks(&session.structured_answers, self.profile.age_group);
        let _ = self.events.send(EngineEvent::RisksReplaced { alerts });

        self.coordinator.cache_write(&session).await;
        self.coordinator.autosave(&session).await;
        Ok(())
    }

    /// Explicit navigation, permitted only to the current stage or one
    /// whose section is already completed.
    pub async fn navigate_to(&self, target: Stage) -> Result<(), EngineError> {
        let (transition, session) = {
            let mut state = self.state.lock().await;
            let now = self.clock.now();
            match machine::navigate(&mut state.session, target, now) {
                Ok(transition) => (transition, state.session.clone()),
                Err(error) => {
                    let anomaly = Anomaly::new(
                        AnomalyKind::NavigationRejected,
                        error.to_string(),
                        state.session.stage,
                        now,
                    );
                    anomaly.emit();
                    let _ = self.events.send(EngineEvent::AnomalyRecorded { anomaly });
                    return Err(error);
                }
            }
        };

        if let Some((from, to)) = transition {
            let _ = self.events.send(EngineEvent::StageChanged { from, to });
        }
        self.coordinator.cache_write(&session).await;
        self.coordinator.autosave(&session).await;
        Ok(())
    }

    /// Pause the interview: freeze the duration counter and persist,
    /// awaited.
    pub async fn pause(&self) -> Result<(), EngineError> {
        let session = {
            let mut state = self.state.lock().await;
            machine::pause(&mut state.session, self.clock.now());
            state.session.clone()
        };
        self.coordinator.cache_write(&session).await;
        self.coordinator.force_save(&session).await
    }

    /// Resume a paused interview. The duration counter continues from its
    /// stored value.
    pub async fn resume(&self) {
        let session = {
            let mut state = self.state.lock().await;
            machine::resume(&mut state.session, self.clock.now());
            state.session.clone()
        };
        info!(session_id = %session.id, "interview resumed");
        self.coordinator.cache_write(&session).await;
    }

    /// Explicit save requested by the user. Awaited.
    pub async fn save(&self) -> Result<(), EngineError> {
        let session = self.snapshot().await;
        self.coordinator.cache_write(&session).await;
        self.coordinator.force_save(&session).await
    }

    /// Final submission: advance to the summary stage, mark the session
    /// completed, and persist, awaited.
    pub async fn complete(&self) -> Result<(), EngineError> {
        let session = {
            let mut state = self.state.lock().await;
            let newly_completed = machine::complete(&mut state.session, self.clock.now());
            for section in &newly_completed {
                info!(section = %section, "section completed at submission");
            }
            state.session.clone()
        };
        let _ = self.events.send(EngineEvent::ProgressUpdated {
            progress: session.progress,
        });
        self.coordinator.cache_write(&session).await;
        self.coordinator.force_save(&session).await
    }

    /// One 1 Hz tick: advance the duration counter while active, sample
    /// engagement, and give the persistence layer its retry chance. The
    /// tick reads session state but never mutates the structured answers.
    pub async fn tick(&self) -> Option<EngagementNotification> {
        let (notification, session) = {
            let mut state = self.state.lock().await;
            let now = self.clock.now();
            if state.session.status == SessionStatus::Active {
                state.session.session_duration_seconds += 1;
            }
            let progress = state.session.progress;
            let notification =
                state
                    .monitor
                    .tick(&state.session, progress, now, self.policy.as_ref());
            (notification, state.session.clone())
        };

        if let Some(notification) = &notification {
            let _ = self.events.send(EngineEvent::Notification {
                notification: notification.clone(),
            });
        }

        self.coordinator.cache_write(&session).await;
        self.coordinator.autosave(&session).await;
        notification
    }

    /// Suppress a notification kind for the rest of the session.
    pub async fn dismiss_notification(&self, kind: NotificationKind) {
        self.state.lock().await.monitor.dismiss(kind);
    }

    fn publish_report(&self, report: &ApplyReport) {
        if let Some((from, to)) = report.transition {
            let _ = self.events.send(EngineEvent::StageChanged { from, to });
        }
        let _ = self.events.send(EngineEvent::ProgressUpdated {
            progress: report.progress,
        });
        let _ = self.events.send(EngineEvent::RisksReplaced {
            alerts: report.alerts.clone(),
        });
        for anomaly in &report.anomalies {
            anomaly.emit();
            let _ = self.events.send(EngineEvent::AnomalyRecorded {
                anomaly: anomaly.clone(),
            });
        }
    }
}

/// Spawn the production 1 Hz ticker for an engine. Tests drive
/// [`InterviewEngine::tick`] directly with a manual clock instead.
pub fn spawn_ticker(engine: Arc<InterviewEngine>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            engine.tick().await;
        }
    })
}

//! Engagement monitoring.
//!
//! A 1 Hz sampler over session timing that produces fatigue and break
//! notifications. Rules are evaluated in a fixed priority order, at most
//! one notification fires per cooldown window, and a dismissed kind stays
//! suppressed for the rest of the session. The decision gate is an
//! injectable deterministic policy, not ambient randomness.

use std::collections::BTreeSet;

use jiff::Timestamp;

use anamnesis_core::models::engagement::{
    EngagementNotification, EngagementSignal, NotificationKind, SuggestedAction,
};
use anamnesis_core::models::session::{InterviewSession, SessionStatus};
use anamnesis_core::models::stage::SECTION_UNIVERSE;

#[derive(Debug, Clone, Copy)]
pub struct EngagementConfig {
    /// Minimum seconds between any two notifications.
    pub cooldown_seconds: i64,
    pub long_session_threshold_seconds: u64,
    pub long_session_progress_cap: u8,
    pub inactivity_threshold_ms: u64,
    pub rapid_window_seconds: u64,
    pub break_threshold_seconds: u64,
    pub break_progress_floor: u8,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: 120,
            long_session_threshold_seconds: 900,
            long_session_progress_cap: 50,
            inactivity_threshold_ms: 180_000,
            rapid_window_seconds: 120,
            break_threshold_seconds: 1200,
            break_progress_floor: 40,
        }
    }
}

/// Final gate on a candidate notification. The production default always
/// approves; tests and product experiments inject their own.
pub trait NotificationPolicy: Send + Sync {
    fn approve(&self, kind: NotificationKind, signal: &EngagementSignal) -> bool;
}

#[derive(Debug, Default)]
pub struct AlwaysNotify;

impl NotificationPolicy for AlwaysNotify {
    fn approve(&self, _kind: NotificationKind, _signal: &EngagementSignal) -> bool {
        true
    }
}

#[derive(Debug)]
pub struct EngagementMonitor {
    config: EngagementConfig,
    last_emitted_at: Option<Timestamp>,
    dismissed: BTreeSet<NotificationKind>,
}

impl EngagementMonitor {
    pub fn new(config: EngagementConfig) -> Self {
        Self {
            config,
            last_emitted_at: None,
            dismissed: BTreeSet::new(),
        }
    }

    /// Suppress a notification kind for the remainder of the session.
    pub fn dismiss(&mut self, kind: NotificationKind) {
        self.dismissed.insert(kind);
    }

    /// Derive the current engagement signal from session timing.
    pub fn sample(&self, session: &InterviewSession, now: Timestamp) -> EngagementSignal {
        let since_input = now
            .duration_since(session.last_input_at)
            .as_millis()
            .max(0) as u64;
        EngagementSignal {
            session_duration_seconds: session.session_duration_seconds,
            time_since_last_input_ms: since_input,
            completed_count: session.completed_sections.len(),
            total_count: SECTION_UNIVERSE.len(),
        }
    }

    /// One 1 Hz tick. Returns a notification when a rule fires and every
    /// gate (pause state, cooldown, dismissal, policy) lets it through.
    pub fn tick(
        &mut self,
        session: &InterviewSession,
        progress: u8,
        now: Timestamp,
        policy: &dyn NotificationPolicy,
    ) -> Option<EngagementNotification> {
        if session.status != SessionStatus::Active {
            return None;
        }

        if let Some(last) = self.last_emitted_at
            && now.duration_since(last).as_secs() < self.config.cooldown_seconds
        {
            return None;
        }

        let signal = self.sample(session, now);
        let kind = self.first_matching_rule(&signal, progress)?;

        if !policy.approve(kind, &signal) {
            return None;
        }

        self.last_emitted_at = Some(now);
        Some(build_notification(kind))
    }

    /// Evaluate the rules in priority order, skipping dismissed kinds.
    fn first_matching_rule(&self, signal: &EngagementSignal, progress: u8) -> Option<NotificationKind> {
        let duration = signal.session_duration_seconds;
        let config = &self.config;

        let candidates = [
            (
                NotificationKind::LongSession,
                duration > config.long_session_threshold_seconds
                    && progress < config.long_session_progress_cap,
            ),
            (
                NotificationKind::Inactivity,
                signal.time_since_last_input_ms > config.inactivity_threshold_ms,
            ),
            (
                NotificationKind::RapidClicking,
                duration > 0
                    && duration < config.rapid_window_seconds
                    && signal.completed_count < 1
                    && duration % 30 == 0,
            ),
            (
                NotificationKind::BreakReminder,
                duration > config.break_threshold_seconds
                    && duration % config.break_threshold_seconds < 10
                    && progress >= config.break_progress_floor,
            ),
        ];

        candidates
            .into_iter()
            .find(|(kind, matched)| *matched && !self.dismissed.contains(kind))
            .map(|(kind, _)| kind)
    }
}

impl Default for EngagementMonitor {
    fn default() -> Self {
        Self::new(EngagementConfig::default())
    }
}

fn build_notification(kind: NotificationKind) -> EngagementNotification {
    match kind {
        NotificationKind::LongSession => EngagementNotification {
            kind,
            title: "Sesión larga".to_string(),
            message: "Llevas un buen rato en la entrevista. Puedes pausar y retomar \
                      cuando quieras — tu avance queda guardado."
                .to_string(),
            suggested_actions: vec![SuggestedAction::Pause, SuggestedAction::Continue],
        },
        NotificationKind::Inactivity => EngagementNotification {
            kind,
            title: "¿Sigues ahí?".to_string(),
            message: "No hemos recibido respuestas en unos minutos. Si necesitas un \
                      descanso, puedes pausar la entrevista."
                .to_string(),
            suggested_actions: vec![SuggestedAction::Pause, SuggestedAction::Continue],
        },
        NotificationKind::RapidClicking => EngagementNotification {
            kind,
            title: "¿Necesitas ayuda?".to_string(),
            message: "Parece que estás avanzando muy rápido. Si alguna pregunta no es \
                      clara, podemos explicarla."
                .to_string(),
            suggested_actions: vec![SuggestedAction::Help, SuggestedAction::Dismiss],
        },
        NotificationKind::BreakReminder => EngagementNotification {
            kind,
            title: "Recordatorio de descanso".to_string(),
            message: "Llevas más de veinte minutos. Un descanso corto puede ayudarte a \
                      responder con calma."
                .to_string(),
            suggested_actions: vec![SuggestedAction::Continue],
        },
    }
}

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Derived timing metrics sampled once per second while a session is
/// active. Ephemeral — never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EngagementSignal {
    pub session_duration_seconds: u64,
    pub time_since_last_input_ms: u64,
    pub completed_count: usize,
    pub total_count: usize,
}

/// The fatigue/engagement pattern a notification reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum NotificationKind {
    LongSession,
    Inactivity,
    RapidClicking,
    BreakReminder,
}

/// An action the presentation layer may offer alongside a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SuggestedAction {
    Pause,
    Help,
    Dismiss,
    Continue,
}

/// A fatigue/break notification emitted by the engagement monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EngagementNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub suggested_actions: Vec<SuggestedAction>,
}

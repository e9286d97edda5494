//! Observer events.
//!
//! The engine broadcasts state changes so UI-adjacent observers can
//! subscribe instead of sharing mutable session state. Slow subscribers
//! lag and drop, they never block the mutation path.

use anamnesis_core::models::alert::RiskAlert;
use anamnesis_core::models::engagement::EngagementNotification;
use anamnesis_core::models::stage::Stage;

use crate::anomaly::Anomaly;

#[derive(Debug, Clone)]
pub enum EngineEvent {
    StageChanged { from: Stage, to: Stage },
    ProgressUpdated { progress: u8 },
    /// The full replacement list from the latest risk evaluation.
    RisksReplaced { alerts: Vec<RiskAlert> },
    Notification { notification: EngagementNotification },
    AnomalyRecorded { anomaly: Anomaly },
}

//! Completion-percentage math.
//!
//! Progress is the sum of the weights of all stages strictly before the
//! current one, plus the current stage's weight scaled by how many user
//! interactions it has received (full credit at five).

use crate::models::session::InterviewSession;
use crate::models::stage::Stage;

/// Interactions needed before the current stage earns its full weight.
const FULL_CREDIT_INTERACTIONS: f64 = 5.0;

/// Compute the completion percentage for a session. Deterministic and
/// idempotent: the same session state always yields the same value.
pub fn compute_progress(session: &InterviewSession) -> u8 {
    let prior: u32 = Stage::ALL
        .iter()
        .take_while(|s| **s != session.stage)
        .map(|s| s.weight() as u32)
        .sum();

    let answered = session.answered_count_for(session.stage) as f64;
    let fraction = (answered / FULL_CREDIT_INTERACTIONS).min(1.0);
    let current = (session.stage.weight() as f64 * fraction).floor() as u32;

    (prior + current).min(100) as u8
}

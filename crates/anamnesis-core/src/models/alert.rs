use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Severity of a risk alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// The composite pattern a risk rule looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum RiskType {
    Cardiovascular,
    MentalHealth,
    Geriatric,
}

/// A severity-tagged finding produced by evaluating the structured answers
/// against the risk rule catalog.
///
/// Alert lists are recomputed, not accumulated: each evaluation fully
/// replaces the prior list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RiskAlert {
    pub alert_type: RiskType,
    pub description: String,
    pub severity: Severity,
    pub recommendation: Option<String>,
    /// `section.field` paths of the answers that triggered the rule.
    pub triggering_fields: Vec<String>,
}

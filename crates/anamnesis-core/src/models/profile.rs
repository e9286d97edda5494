use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Demographic age band. The band drives age-conditional interview rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum AgeGroup {
    Infantil,
    Adulto,
    AdultoMayor,
}

impl AgeGroup {
    /// Band boundaries follow the platform's patient registration form.
    pub fn from_age_years(age: u16) -> Self {
        match age {
            0..=17 => AgeGroup::Infantil,
            18..=64 => AgeGroup::Adulto,
            _ => AgeGroup::AdultoMayor,
        }
    }
}

/// The demographic context handed to the question synthesizer, risk
/// detector, and extraction capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DemographicProfile {
    pub age_group: AgeGroup,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub age_years: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sex: Option<String>,
}

impl DemographicProfile {
    pub fn new(age_group: AgeGroup) -> Self {
        Self {
            age_group,
            age_years: None,
            sex: None,
        }
    }
}

//! anamnesis-rules
//!
//! The consolidated rule engine for the clinical interview: question
//! synthesis and composite risk detection. Pure data and pure functions —
//! no AWS dependency. Both catalogs are registered here so new rules can
//! be added without changing any call site.

pub mod answers;
pub mod questions;
pub mod risks;

/// Catalog version. Bump whenever a rule is added, removed, or changes
/// its output, so downstream consumers can tell which rule set produced
/// a stored alert or question list.
pub const RULESET_VERSION: u32 = 3;

pub use questions::derive_questions;
pub use risks::evaluate_risks;

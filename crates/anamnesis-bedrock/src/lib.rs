//! anamnesis-bedrock
//!
//! The production extraction capability: Bedrock Converse invocation and
//! tolerant structured-output parsing for the interview engine.

pub mod error;
pub mod extract;
pub mod prompt;

//! anamnesis-core
//!
//! Pure domain types, progress math, and store key conventions for the
//! adaptive clinical interview engine. No AWS dependency — this is the
//! shared vocabulary of the anamnesis system.

pub mod error;
pub mod models;
pub mod progress;
pub mod store_keys;

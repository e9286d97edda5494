//! anamnesis-storage
//!
//! The durable tier of session persistence: S3 wrappers and the
//! patient-keyed session store with its append-only history collection.

pub mod error;
pub mod objects;
pub mod store;

//! Durable-store key conventions.
//!
//! Pure string functions — no AWS SDK dependency. These define the
//! canonical layout of session documents and history records: one session
//! document per patient, plus an append-only history collection keyed by
//! `(patient_id, snapshot timestamp)`.

use uuid::Uuid;

pub fn session(patient_id: Uuid) -> String {
    format!("sessions/{patient_id}.json")
}

pub const SESSIONS_PREFIX: &str = "sessions/";

pub fn history(patient_id: Uuid, snapshot_at: jiff::Timestamp) -> String {
    // Colons are valid in S3 keys; the RFC 3339 form keeps records
    // lexicographically ordered by snapshot time.
    format!("history/{patient_id}/{snapshot_at}.json")
}

pub fn history_prefix(patient_id: Uuid) -> String {
    format!("history/{patient_id}/")
}

//! Audit domain - append-only account event trail

mod entity;
mod log;

pub use entity::{AuditEntry, AuditEntryId, AuditEvent};
pub use log::AuditLog;

//! Audit log trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::AuditEntry;
use crate::domain::user::UserUuid;
use crate::domain::DomainError;

/// Append-only audit sink
///
/// `write` must surface every persistence failure to the caller.
#[async_trait]
pub trait AuditLog: Send + Sync + Debug {
    async fn write(&self, entry: AuditEntry) -> Result<(), DomainError>;

    /// Entries recorded for a user, oldest first
    async fn entries_for(&self, user_uuid: &UserUuid) -> Result<Vec<AuditEntry>, DomainError>;
}

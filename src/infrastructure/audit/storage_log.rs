//! Storage-backed audit log

use async_trait::async_trait;
use std::sync::Arc;
use tracing::error;

use crate::domain::audit::{AuditEntry, AuditLog};
use crate::domain::storage::Storage;
use crate::domain::user::UserUuid;
use crate::domain::DomainError;

/// Appends audit entries to a storage table; entries are never updated
#[derive(Debug)]
pub struct StorageAuditLog {
    storage: Arc<dyn Storage<AuditEntry>>,
}

impl StorageAuditLog {
    pub fn new(storage: Arc<dyn Storage<AuditEntry>>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl AuditLog for StorageAuditLog {
    async fn write(&self, entry: AuditEntry) -> Result<(), DomainError> {
        let event = entry.event();
        let user_uuid = entry.user_uuid().clone();

        self.storage.create(entry).await.map_err(|e| {
            error!(event = %event, user_uuid = %user_uuid, error = %e, "Failed to append audit entry");
            e
        })?;

        Ok(())
    }

    async fn entries_for(&self, user_uuid: &UserUuid) -> Result<Vec<AuditEntry>, DomainError> {
        self.storage.find_by_text("user_uuid", user_uuid.as_str()).await
    }
}

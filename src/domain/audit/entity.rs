//! Audit entry entity

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::storage::{StorageEntity, StorageKey};
use crate::domain::user::UserUuid;

/// Time-ordered entry identifier (UUID v7)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AuditEntryId(String);

impl AuditEntryId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }
}

impl StorageKey for AuditEntryId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditEvent {
    #[serde(rename = "User Registered")]
    UserRegistered,
    #[serde(rename = "Users Data Updated")]
    UserDataUpdated,
    #[serde(rename = "User Deleted")]
    UserDeleted,
    #[serde(rename = "User Login")]
    UserLogin,
    #[serde(rename = "User Logout")]
    UserLogout,
    #[serde(rename = "User Profile Updated")]
    ProfileUpdated,
}

impl AuditEvent {
    pub fn label(&self) -> &'static str {
        match self {
            Self::UserRegistered => "User Registered",
            Self::UserDataUpdated => "Users Data Updated",
            Self::UserDeleted => "User Deleted",
            Self::UserLogin => "User Login",
            Self::UserLogout => "User Logout",
            Self::ProfileUpdated => "User Profile Updated",
        }
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Immutable record of one account event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    id: AuditEntryId,
    timestamp: DateTime<Utc>,
    user_uuid: UserUuid,
    actor: String,
    event: AuditEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    old: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    new: Option<Value>,
}

impl StorageEntity for AuditEntry {
    type Key = AuditEntryId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

impl AuditEntry {
    pub fn new(user_uuid: UserUuid, actor: impl Into<String>, event: AuditEvent) -> Self {
        Self {
            id: AuditEntryId::generate(),
            timestamp: Utc::now(),
            user_uuid,
            actor: actor.into(),
            event,
            old: None,
            new: None,
        }
    }

    pub fn with_old(mut self, snapshot: Value) -> Self {
        self.old = Some(snapshot);
        self
    }

    pub fn with_new(mut self, snapshot: Value) -> Self {
        self.new = Some(snapshot);
        self
    }

    pub fn id(&self) -> &AuditEntryId {
        &self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn user_uuid(&self) -> &UserUuid {
        &self.user_uuid
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    pub fn event(&self) -> AuditEvent {
        self.event
    }

    pub fn old(&self) -> Option<&Value> {
        self.old.as_ref()
    }

    pub fn new_snapshot(&self) -> Option<&Value> {
        self.new.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_labels_serialize() {
        assert_eq!(serde_json::to_value(AuditEvent::UserDataUpdated).unwrap(), json!("Users Data Updated"));
        assert_eq!(AuditEvent::UserLogin.to_string(), "User Login");
    }

    #[test]
    fn test_entry_snapshots() {
        let entry = AuditEntry::new(UserUuid::generate(), "admin@example.com", AuditEvent::UserDeleted)
            .with_old(json!({"status": "active"}))
            .with_new(json!({"status": "closed"}));

        assert_eq!(entry.actor(), "admin@example.com");
        assert_eq!(entry.old(), Some(&json!({"status": "active"})));
        assert_eq!(entry.new_snapshot(), Some(&json!({"status": "closed"})));

        let wire = serde_json::to_value(&entry).unwrap();
        assert_eq!(wire["event"], json!("User Deleted"));
    }
}

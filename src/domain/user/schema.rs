//! Static schema descriptor for the user record
//!
//! Every field the account core knows about is declared here once, with its
//! value kind and protection tier. Access policy, validation and projections
//! walk this table instead of discovering fields at runtime.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Who may write a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectionTier {
    /// Assigned at creation, never written again
    Immutable,
    /// Written only by the login operation
    LoginManaged,
    /// Writable by administrators only
    AdminOnly,
    /// Writable by the owner and by administrators
    Public,
}

impl ProtectionTier {
    /// Fields of this tier are never accepted from request input
    pub fn is_protected(&self) -> bool {
        matches!(self, Self::Immutable | Self::LoginManaged)
    }
}

/// Shape of a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    InternalId,
    Uuid,
    Email,
    Credential,
    Text,
    Status,
    Scopes,
    Timestamp,
    Counter,
}

/// Fields of the user record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserField {
    Id,
    Uuid,
    Email,
    Password,
    Firstname,
    Lastname,
    Status,
    Scopes,
    Created,
    LoginLast,
    LoginCount,
}

/// Descriptor for a single user field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub field: UserField,
    pub name: &'static str,
    pub kind: FieldKind,
    pub tier: ProtectionTier,
    /// Must be present and non-empty when a record is created
    pub required: bool,
    /// Part of the standard exported projection
    pub exported: bool,
}

const fn descriptor(
    field: UserField,
    name: &'static str,
    kind: FieldKind,
    tier: ProtectionTier,
    required: bool,
    exported: bool,
) -> FieldDescriptor {
    FieldDescriptor {
        field,
        name,
        kind,
        tier,
        required,
        exported,
    }
}

/// The user schema, in projection order
pub const USER_SCHEMA: [FieldDescriptor; 11] = [
    descriptor(UserField::Id, "id", FieldKind::InternalId, ProtectionTier::Immutable, false, false),
    descriptor(UserField::Uuid, "uuid", FieldKind::Uuid, ProtectionTier::Immutable, true, true),
    descriptor(UserField::Email, "email", FieldKind::Email, ProtectionTier::Public, true, true),
    descriptor(UserField::Password, "password", FieldKind::Credential, ProtectionTier::Public, false, false),
    descriptor(UserField::Firstname, "firstname", FieldKind::Text, ProtectionTier::Public, false, true),
    descriptor(UserField::Lastname, "lastname", FieldKind::Text, ProtectionTier::Public, false, true),
    descriptor(UserField::Status, "status", FieldKind::Status, ProtectionTier::AdminOnly, true, true),
    descriptor(UserField::Scopes, "scopes", FieldKind::Scopes, ProtectionTier::AdminOnly, true, true),
    descriptor(UserField::Created, "created", FieldKind::Timestamp, ProtectionTier::Immutable, true, true),
    descriptor(UserField::LoginLast, "login_last", FieldKind::Timestamp, ProtectionTier::LoginManaged, false, true),
    descriptor(UserField::LoginCount, "login_count", FieldKind::Counter, ProtectionTier::LoginManaged, false, true),
];

impl UserField {
    /// `USER_SCHEMA` is declared in enum order
    pub fn descriptor(self) -> &'static FieldDescriptor {
        &USER_SCHEMA[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    pub fn tier(self) -> ProtectionTier {
        self.descriptor().tier
    }

    pub fn kind(self) -> FieldKind {
        self.descriptor().kind
    }

    /// Look up a field by its wire name
    pub fn from_name(name: &str) -> Option<Self> {
        USER_SCHEMA.iter().find(|d| d.name == name).map(|d| d.field)
    }

    pub fn all() -> impl Iterator<Item = UserField> {
        USER_SCHEMA.iter().map(|d| d.field)
    }
}

impl fmt::Display for UserField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_field_has_exactly_one_descriptor() {
        for (index, descriptor) in USER_SCHEMA.iter().enumerate() {
            assert_eq!(descriptor.field as usize, index);
        }
        for field in UserField::all() {
            let count = USER_SCHEMA.iter().filter(|d| d.field == field).count();
            assert_eq!(count, 1, "{field} declared {count} times");
            assert_eq!(field.descriptor().field, field);
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(UserField::from_name("login_count"), Some(UserField::LoginCount));
        assert_eq!(UserField::from_name("password"), Some(UserField::Password));
        assert_eq!(UserField::from_name("nickname"), None);
    }

    #[test]
    fn test_protected_tiers() {
        assert!(UserField::Id.tier().is_protected());
        assert!(UserField::Uuid.tier().is_protected());
        assert!(UserField::Created.tier().is_protected());
        assert!(UserField::LoginLast.tier().is_protected());
        assert!(UserField::LoginCount.tier().is_protected());
        assert!(!UserField::Status.tier().is_protected());
        assert_eq!(UserField::Scopes.tier(), ProtectionTier::AdminOnly);
    }

    #[test]
    fn test_credential_is_never_exported() {
        assert!(!UserField::Password.descriptor().exported);
        assert!(!UserField::Id.descriptor().exported);
    }
}

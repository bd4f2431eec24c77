//! Role-based field access policy

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::user::{ProtectionTier, Scopes, User, UserField, UserUuid, ADMIN_SCOPE, USER_SCHEMA};

/// Role of the caller relative to the record it acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Acting on their own record only
    #[serde(rename = "self")]
    SelfService,
    /// Acting on any record
    Admin,
}

impl Role {
    pub fn from_scopes(scopes: &Scopes) -> Self {
        if scopes.contains(ADMIN_SCOPE) {
            Self::Admin
        } else {
            Self::SelfService
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Resolved identity of the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub uuid: UserUuid,
    pub role: Role,
}

impl Requester {
    pub fn new(uuid: UserUuid, role: Role) -> Self {
        Self { uuid, role }
    }

    pub fn admin(uuid: UserUuid) -> Self {
        Self::new(uuid, Role::Admin)
    }

    pub fn owner(uuid: UserUuid) -> Self {
        Self::new(uuid, Role::SelfService)
    }

    pub fn for_user(user: &User) -> Self {
        Self::new(user.uuid().clone(), Role::from_scopes(user.scopes()))
    }

    /// Administrators reach every record, everyone else only their own
    pub fn can_access(&self, target: &UserUuid) -> bool {
        self.role.is_admin() || &self.uuid == target
    }
}

/// Kind of write being performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOperation {
    Create,
    /// Partial update, only supplied fields change
    Merge,
    /// Full update, every replaceable field is reset first
    Replace,
}

/// Which representation a read returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadView {
    #[default]
    Standard,
    /// Full internal representation, honoured for administrators only
    #[serde(alias = "admin")]
    Raw,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub view: ReadView,
    /// Empty means every field of the view
    pub fields: Vec<String>,
}

impl ReadOptions {
    pub fn raw() -> Self {
        Self {
            view: ReadView::Raw,
            fields: Vec::new(),
        }
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// Masks write input and read output according to role and schema tiers
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldAccessPolicy;

impl FieldAccessPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Fields the role may set for the given operation
    pub fn resolve_writable_fields(&self, role: Role, operation: WriteOperation) -> BTreeSet<UserField> {
        if operation == WriteOperation::Replace && !role.is_admin() {
            return BTreeSet::new();
        }

        USER_SCHEMA
            .iter()
            .filter(|d| !d.tier.is_protected())
            .filter(|d| role.is_admin() || d.tier != ProtectionTier::AdminOnly)
            .map(|d| d.field)
            .collect()
    }

    /// Drop every input key the role may not write, including unknown keys
    pub fn filter_input(
        &self,
        role: Role,
        operation: WriteOperation,
        input: &Map<String, Value>,
    ) -> Map<String, Value> {
        let writable = self.resolve_writable_fields(role, operation);

        input
            .iter()
            .filter(|(name, _)| UserField::from_name(name).is_some_and(|f| writable.contains(&f)))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Projection of `user` returned to a caller with `role`
    pub fn resolve_read_projection(
        &self,
        role: Role,
        user: &User,
        options: &ReadOptions,
    ) -> Map<String, Value> {
        let mut projection = match (role, options.view) {
            (Role::Admin, ReadView::Raw) => user.internal_fields(),
            _ => user.exported_fields(),
        };

        if !options.fields.is_empty() {
            projection.retain(|name, _| options.fields.iter().any(|f| f == name));
        }

        projection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn input() -> Map<String, Value> {
        json!({
            "id": "x",
            "uuid": "y",
            "created": "2020-01-01T00:00:00Z",
            "login_last": "2020-01-01T00:00:00Z",
            "login_count": 99,
            "status": "active",
            "scopes": ["user", "admin"],
            "email": "ada@example.com",
            "firstname": "Ada",
            "password": "correct horse",
            "nickname": "not a user field"
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    fn keys(map: &Map<String, Value>) -> Vec<&str> {
        map.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_protected_fields_always_stripped() {
        let policy = FieldAccessPolicy::new();

        for operation in [WriteOperation::Create, WriteOperation::Merge, WriteOperation::Replace] {
            let filtered = policy.filter_input(Role::Admin, operation, &input());
            for protected in ["id", "uuid", "created", "login_last", "login_count", "nickname"] {
                assert!(!filtered.contains_key(protected), "{protected} kept for {operation:?}");
            }
            assert!(filtered.contains_key("status"));
            assert!(filtered.contains_key("scopes"));
        }
    }

    #[test]
    fn test_self_service_cannot_write_status_or_scopes() {
        let policy = FieldAccessPolicy::new();
        let filtered = policy.filter_input(Role::SelfService, WriteOperation::Merge, &input());

        assert_eq!(keys(&filtered), vec!["email", "firstname", "password"]);
    }

    #[test]
    fn test_replace_is_admin_only() {
        let policy = FieldAccessPolicy::new();
        assert!(policy
            .resolve_writable_fields(Role::SelfService, WriteOperation::Replace)
            .is_empty());
        assert!(policy
            .resolve_writable_fields(Role::Admin, WriteOperation::Replace)
            .contains(&UserField::Scopes));
    }

    #[test]
    fn test_read_projection_views() {
        let policy = FieldAccessPolicy::new();
        let mut user = User::template(Utc::now());
        user.set_field(UserField::Email, &json!("ada@example.com")).unwrap();
        user.set_credential_hash("$argon2id$secret");

        let standard = policy.resolve_read_projection(Role::Admin, &user, &ReadOptions::default());
        assert!(!standard.contains_key("id"));

        let raw = policy.resolve_read_projection(Role::Admin, &user, &ReadOptions::raw());
        assert!(raw.contains_key("id"));
        assert!(!raw.contains_key("password"));

        let self_raw = policy.resolve_read_projection(Role::SelfService, &user, &ReadOptions::raw());
        assert_eq!(self_raw, standard);
    }

    #[test]
    fn test_read_projection_requested_fields() {
        let policy = FieldAccessPolicy::new();
        let user = User::template(Utc::now());
        let options = ReadOptions::default().with_fields(["email", "status", "password", "bogus"]);

        let projection = policy.resolve_read_projection(Role::SelfService, &user, &options);
        assert_eq!(keys(&projection), vec!["email", "status"]);
        assert_eq!(projection["email"], Value::Null);
    }

    #[test]
    fn test_requester_access() {
        let me = UserUuid::generate();
        let other = UserUuid::generate();

        assert!(Requester::owner(me.clone()).can_access(&me));
        assert!(!Requester::owner(me.clone()).can_access(&other));
        assert!(Requester::admin(me).can_access(&other));
        assert_eq!(Role::from_scopes(&Scopes::new(["user", "admin"])), Role::Admin);
    }
}

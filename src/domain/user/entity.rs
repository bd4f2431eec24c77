//! User entity and related types

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::schema::{ProtectionTier, UserField, USER_SCHEMA};
use super::validation::{ValidationRule, Violation};
use crate::domain::storage::{StorageEntity, StorageKey};
use crate::domain::DomainError;

/// Scope every login-capable account carries
pub const USER_SCOPE: &str = "user";
/// Scope granting the administrator role
pub const ADMIN_SCOPE: &str = "admin";

static SCOPE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_-]*$").unwrap());
static SCOPE_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s,]+").unwrap());

/// Public user identifier, a lowercase hyphenated UUID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserUuid(String);

impl UserUuid {
    pub fn new(id: impl AsRef<str>) -> Result<Self, DomainError> {
        let parsed = Uuid::parse_str(id.as_ref())
            .map_err(|_| DomainError::invalid_id(format!("'{}' is not a uuid", id.as_ref())))?;
        Ok(Self(parsed.hyphenated().to_string()))
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl StorageKey for UserUuid {
    fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserUuid {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserUuid> for String {
    fn from(id: UserUuid) -> Self {
        id.0
    }
}

impl FromStr for UserUuid {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for UserUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Registered,
    Active,
    Closed,
    Suspended,
    Cancelled,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Active => "active",
            Self::Closed => "closed",
            Self::Suspended => "suspended",
            Self::Cancelled => "cancelled",
        }
    }

    /// Closed, suspended and cancelled accounts cannot log in
    pub fn blocks_login(&self) -> bool {
        matches!(self, Self::Closed | Self::Suspended | Self::Cancelled)
    }
}

impl FromStr for UserStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "registered" => Ok(Self::Registered),
            "active" => Ok(Self::Active),
            "closed" => Ok(Self::Closed),
            "suspended" => Ok(Self::Suspended),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::validation(format!("Unknown status '{other}'"))),
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Set of role tokens held by an account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scopes(BTreeSet<String>);

impl Scopes {
    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(scopes.into_iter().map(Into::into).collect())
    }

    /// Parse scopes from a JSON array of tokens or a comma/space separated string
    pub fn from_value(value: &Value) -> Result<Self, ValidationRule> {
        let tokens: Vec<String> = match value {
            Value::Null => Vec::new(),
            Value::String(s) => SCOPE_SEPARATOR
                .split(s)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string).ok_or(ValidationRule::Type))
                .collect::<Result<_, _>>()?,
            _ => return Err(ValidationRule::Type),
        };

        if tokens.iter().any(|t| !SCOPE_PATTERN.is_match(t)) {
            return Err(ValidationRule::Scopes);
        }

        Ok(Self(tokens.into_iter().collect()))
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.0.iter().cloned().map(Value::String).collect())
    }
}

/// Reason a login attempt was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "status", rename_all = "snake_case")]
pub enum LoginDenial {
    AccountNotFound,
    MissingUserScope,
    AccountDisabled(UserStatus),
    InvalidCredentials,
}

impl fmt::Display for LoginDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccountNotFound => write!(f, "account not found"),
            Self::MissingUserScope => write!(f, "account lacks the '{USER_SCOPE}' scope"),
            Self::AccountDisabled(status) => write!(f, "account is {status}"),
            Self::InvalidCredentials => write!(f, "invalid credentials"),
        }
    }
}

/// User account record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    id: Uuid,
    uuid: UserUuid,
    #[serde(default)]
    email: Option<String>,
    /// Argon2 PHC string; `None` until a credential is first set
    #[serde(default)]
    credential_hash: Option<String>,
    #[serde(default)]
    firstname: Option<String>,
    #[serde(default)]
    lastname: Option<String>,
    #[serde(default)]
    status: Option<UserStatus>,
    #[serde(default)]
    scopes: Scopes,
    created: DateTime<Utc>,
    #[serde(default)]
    login_last: Option<DateTime<Utc>>,
    #[serde(default)]
    login_count: u64,
}

impl StorageEntity for User {
    type Key = UserUuid;

    fn key(&self) -> &Self::Key {
        &self.uuid
    }
}

impl User {
    /// New-account template: fresh identifiers, `registered`, `{user}` and a zero login count
    pub fn template(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            uuid: UserUuid::generate(),
            email: None,
            credential_hash: None,
            firstname: None,
            lastname: None,
            status: Some(UserStatus::Registered),
            scopes: Scopes::new([USER_SCOPE]),
            created: now,
            login_last: None,
            login_count: 0,
        }
    }

    // Getters

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn uuid(&self) -> &UserUuid {
        &self.uuid
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn credential_hash(&self) -> Option<&str> {
        self.credential_hash.as_deref()
    }

    pub fn firstname(&self) -> Option<&str> {
        self.firstname.as_deref()
    }

    pub fn lastname(&self) -> Option<&str> {
        self.lastname.as_deref()
    }

    pub fn status(&self) -> Option<UserStatus> {
        self.status
    }

    pub fn scopes(&self) -> &Scopes {
        &self.scopes
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn login_last(&self) -> Option<DateTime<Utc>> {
        self.login_last
    }

    pub fn login_count(&self) -> u64 {
        self.login_count
    }

    pub fn is_admin(&self) -> bool {
        self.scopes.contains(ADMIN_SCOPE)
    }

    /// Reason this account may not log in, if any
    pub fn login_denial(&self) -> Option<LoginDenial> {
        if !self.scopes.contains(USER_SCOPE) {
            return Some(LoginDenial::MissingUserScope);
        }
        match self.status {
            Some(status) if status.blocks_login() => Some(LoginDenial::AccountDisabled(status)),
            _ => None,
        }
    }

    // Projections

    /// JSON value of a single field; the credential hash is included for `Password`
    pub fn field_value(&self, field: UserField) -> Value {
        fn opt_str(value: &Option<String>) -> Value {
            value.clone().map(Value::String).unwrap_or(Value::Null)
        }

        match field {
            UserField::Id => Value::String(self.id.to_string()),
            UserField::Uuid => Value::String(self.uuid.to_string()),
            UserField::Email => opt_str(&self.email),
            UserField::Password => opt_str(&self.credential_hash),
            UserField::Firstname => opt_str(&self.firstname),
            UserField::Lastname => opt_str(&self.lastname),
            UserField::Status => self
                .status
                .map(|s| Value::String(s.as_str().to_string()))
                .unwrap_or(Value::Null),
            UserField::Scopes => self.scopes.to_value(),
            UserField::Created => Value::String(format_timestamp(self.created)),
            UserField::LoginLast => self
                .login_last
                .map(|t| Value::String(format_timestamp(t)))
                .unwrap_or(Value::Null),
            UserField::LoginCount => Value::from(self.login_count),
        }
    }

    /// Standard exported projection, never carrying credential material
    pub fn exported_fields(&self) -> Map<String, Value> {
        USER_SCHEMA
            .iter()
            .filter(|d| d.exported)
            .map(|d| (d.name.to_string(), self.field_value(d.field)))
            .collect()
    }

    /// Full internal representation minus the credential hash
    pub fn internal_fields(&self) -> Map<String, Value> {
        USER_SCHEMA
            .iter()
            .filter(|d| d.field != UserField::Password)
            .map(|d| (d.name.to_string(), self.field_value(d.field)))
            .collect()
    }

    /// Snapshot stored in audit entries
    pub fn snapshot(&self) -> Value {
        Value::Object(self.internal_fields())
    }

    // Mutators

    /// Apply a submitted value to a writable field
    ///
    /// Protected fields and the credential are refused; the credential only
    /// changes through [`User::set_credential_hash`].
    pub fn set_field(&mut self, field: UserField, value: &Value) -> Result<(), Violation> {
        let name = field.name();
        if field.tier().is_protected() || field == UserField::Password {
            return Err(Violation::new(name, ValidationRule::Immutable));
        }

        let text = |value: &Value| -> Result<Option<String>, Violation> {
            match value {
                Value::Null => Ok(None),
                Value::String(s) if s.trim().is_empty() => Ok(None),
                Value::String(s) => Ok(Some(s.trim().to_string())),
                _ => Err(Violation::new(name, ValidationRule::Type)),
            }
        };

        match field {
            UserField::Email => self.email = text(value)?,
            UserField::Firstname => self.firstname = text(value)?,
            UserField::Lastname => self.lastname = text(value)?,
            UserField::Status => {
                self.status = match text(value)? {
                    Some(s) => Some(
                        s.parse()
                            .map_err(|_| Violation::new(name, ValidationRule::Status))?,
                    ),
                    None => None,
                }
            }
            UserField::Scopes => {
                self.scopes =
                    Scopes::from_value(value).map_err(|rule| Violation::new(name, rule))?
            }
            _ => return Err(Violation::new(name, ValidationRule::Immutable)),
        }
        Ok(())
    }

    /// Null every field a full replace resets; identity, login bookkeeping and the credential stay
    pub fn clear_replaceable(&mut self) {
        for descriptor in USER_SCHEMA.iter() {
            if descriptor.field == UserField::Password {
                continue;
            }
            match descriptor.tier {
                ProtectionTier::Public | ProtectionTier::AdminOnly => {
                    // set_field only fails for protected fields
                    let _ = self.set_field(descriptor.field, &Value::Null);
                }
                ProtectionTier::Immutable | ProtectionTier::LoginManaged => {}
            }
        }
    }

    pub fn set_credential_hash(&mut self, hash: impl Into<String>) {
        self.credential_hash = Some(hash.into());
    }

    pub fn record_login(&mut self, now: DateTime<Utc>) {
        self.login_count = self.login_count.saturating_add(1);
        self.login_last = Some(now);
    }

    /// Soft delete
    pub fn close(&mut self) {
        self.status = Some(UserStatus::Closed);
    }
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

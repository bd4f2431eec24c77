//! Validation engine for candidate user records
//!
//! Validation never fails fast: every failing rule on every field is reported
//! as a `{field, rule}` pair, in schema order.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entity::{Scopes, UserStatus};
use super::schema::{FieldDescriptor, FieldKind, USER_SCHEMA};

pub const MAX_TEXT_LENGTH: usize = 255;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)+$")
        .unwrap()
});

/// Name of a violated rule, as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationRule {
    Required,
    Type,
    Email,
    MaxLength,
    MinLength,
    Status,
    Scopes,
    Uuid,
    Timestamp,
    Counter,
    Unique,
    Immutable,
}

impl ValidationRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Type => "type",
            Self::Email => "email",
            Self::MaxLength => "max_length",
            Self::MinLength => "min_length",
            Self::Status => "status",
            Self::Scopes => "scopes",
            Self::Uuid => "uuid",
            Self::Timestamp => "timestamp",
            Self::Counter => "counter",
            Self::Unique => "unique",
            Self::Immutable => "immutable",
        }
    }
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single failed rule on a single field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub field: String,
    pub rule: ValidationRule,
}

impl Violation {
    pub fn new(field: impl Into<String>, rule: ValidationRule) -> Self {
        Self {
            field: field.into(),
            rule,
        }
    }
}

/// Ordered, non-empty list of violations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<Violation>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, rule: ValidationRule) -> Self {
        Self(vec![Violation::new(field, rule)])
    }

    pub fn push(&mut self, field: impl Into<String>, rule: ValidationRule) {
        self.0.push(Violation::new(field, rule));
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.0
    }

    pub fn contains(&self, field: &str, rule: ValidationRule) -> bool {
        self.0.iter().any(|v| v.field == field && v.rule == rule)
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|v| format!("{}: {}", v.field, v.rule))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Checks candidate user data against the schema rules
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationEngine;

impl ValidationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Validate a candidate field map
    ///
    /// With `require_all` every required field must be present and non-empty
    /// (creation). Without it, required checks only apply to fields the
    /// candidate actually supplies. Format checks always run on present,
    /// non-null values.
    pub fn validate(
        &self,
        candidate: &Map<String, Value>,
        require_all: bool,
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for descriptor in USER_SCHEMA.iter() {
            let value = candidate.get(descriptor.name);
            let supplied = value.is_some();

            if is_blank(value) {
                if descriptor.required && (require_all || supplied) {
                    errors.push(descriptor.name, ValidationRule::Required);
                }
                continue;
            }

            if let Some(value) = value {
                check_format(descriptor, value, &mut errors);
            }
        }

        errors.into_result()
    }
}

/// Absent, null, whitespace-only string or empty array
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

fn check_format(descriptor: &FieldDescriptor, value: &Value, errors: &mut ValidationErrors) {
    let name = descriptor.name;

    match descriptor.kind {
        FieldKind::Email => match value.as_str().map(str::trim) {
            Some(email) => {
                if email.chars().count() > MAX_TEXT_LENGTH {
                    errors.push(name, ValidationRule::MaxLength);
                }
                if !is_valid_email(email) {
                    errors.push(name, ValidationRule::Email);
                }
            }
            None => errors.push(name, ValidationRule::Type),
        },
        FieldKind::Text => match value.as_str().map(str::trim) {
            Some(text) if text.chars().count() > MAX_TEXT_LENGTH => {
                errors.push(name, ValidationRule::MaxLength)
            }
            Some(_) => {}
            None => errors.push(name, ValidationRule::Type),
        },
        FieldKind::Credential => match value.as_str() {
            Some(secret) => {
                let length = secret.chars().count();
                if length < MIN_PASSWORD_LENGTH {
                    errors.push(name, ValidationRule::MinLength);
                }
                if length > MAX_PASSWORD_LENGTH {
                    errors.push(name, ValidationRule::MaxLength);
                }
            }
            None => errors.push(name, ValidationRule::Type),
        },
        FieldKind::Status => match value.as_str() {
            Some(status) if status.parse::<UserStatus>().is_err() => {
                errors.push(name, ValidationRule::Status)
            }
            Some(_) => {}
            None => errors.push(name, ValidationRule::Type),
        },
        FieldKind::Scopes => match Scopes::from_value(value) {
            Ok(_) => {}
            Err(rule) => errors.push(name, rule),
        },
        FieldKind::Uuid | FieldKind::InternalId => match value.as_str() {
            Some(id) if uuid::Uuid::parse_str(id).is_err() => {
                errors.push(name, ValidationRule::Uuid)
            }
            Some(_) => {}
            None => errors.push(name, ValidationRule::Type),
        },
        FieldKind::Timestamp => match value.as_str() {
            Some(ts) if chrono::DateTime::parse_from_rfc3339(ts).is_err() => {
                errors.push(name, ValidationRule::Timestamp)
            }
            Some(_) => {}
            None => errors.push(name, ValidationRule::Type),
        },
        FieldKind::Counter => {
            if value.as_u64().is_none() {
                errors.push(name, ValidationRule::Counter);
            }
        }
    }
}

//! Profile entry entity and value encoding

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::storage::{StorageEntity, StorageKey};
use crate::domain::user::UserUuid;
use crate::domain::DomainError;

pub const MAX_PROFILE_KEY_LENGTH: usize = 255;

/// Composite `(uuid, key)` identifier, rendered as `uuid:key`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileEntryKey(String);

impl ProfileEntryKey {
    pub fn new(user_uuid: &UserUuid, key: &str) -> Self {
        Self(format!("{}:{}", user_uuid, key))
    }
}

impl StorageKey for ProfileEntryKey {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// Advisory content tag, fixed the first time a key is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileType {
    Text,
    Markdown,
}

impl ProfileType {
    /// Type table consulted when an entry is first created
    pub fn infer(key: &str) -> Option<Self> {
        match key {
            "bio" => Some(Self::Markdown),
            "nickname" => Some(Self::Text),
            _ => None,
        }
    }
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Markdown => write!(f, "markdown"),
        }
    }
}

/// How a stored value is read back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueEncoding {
    #[default]
    Text,
    Json,
}

/// Incoming profile value with the caller's declared encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ProfileValue {
    /// Stored verbatim
    Scalar(String),
    /// Stored as pretty-printed JSON
    Structured(Value),
    /// Strings verbatim, anything else as compact JSON
    Raw(Value),
}

impl ProfileValue {
    /// On-disk representation; empty values become `None`
    ///
    /// A numeric zero is not empty.
    pub fn encode(&self) -> Result<Option<String>, DomainError> {
        let encoded = match self {
            Self::Scalar(s) if s.trim().is_empty() => None,
            Self::Scalar(s) => Some(s.clone()),
            Self::Structured(value) | Self::Raw(value) if is_empty_value(value) => None,
            Self::Structured(value) => Some(
                serde_json::to_string_pretty(value)
                    .map_err(|e| DomainError::internal(format!("Failed to encode value: {e}")))?,
            ),
            Self::Raw(Value::String(s)) => Some(s.clone()),
            Self::Raw(value) => Some(
                serde_json::to_string(value)
                    .map_err(|e| DomainError::internal(format!("Failed to encode value: {e}")))?,
            ),
        };
        Ok(encoded)
    }

    pub fn encoding(&self) -> ValueEncoding {
        match self {
            Self::Scalar(_) | Self::Raw(Value::String(_)) => ValueEncoding::Text,
            Self::Structured(_) | Self::Raw(_) => ValueEncoding::Json,
        }
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) => false,
    }
}

/// One stored profile attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileEntry {
    id: ProfileEntryKey,
    user_uuid: UserUuid,
    key: String,
    value: Option<String>,
    #[serde(default)]
    encoding: ValueEncoding,
    entry_type: Option<ProfileType>,
    updated: DateTime<Utc>,
}

impl StorageEntity for ProfileEntry {
    type Key = ProfileEntryKey;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

impl ProfileEntry {
    /// First write for a key; the type is taken from the type table
    pub fn new(
        user_uuid: UserUuid,
        key: impl Into<String>,
        value: Option<String>,
        encoding: ValueEncoding,
    ) -> Self {
        let key = key.into();
        Self {
            id: ProfileEntryKey::new(&user_uuid, &key),
            entry_type: ProfileType::infer(&key),
            user_uuid,
            key,
            value,
            encoding,
            updated: Utc::now(),
        }
    }

    pub fn user_uuid(&self) -> &UserUuid {
        &self.user_uuid
    }

    pub fn name(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Stored value as the caller submitted it; JSON-encoded text is parsed back
    pub fn decoded(&self) -> Value {
        match (&self.value, self.encoding) {
            (None, _) => Value::Null,
            (Some(text), ValueEncoding::Text) => Value::String(text.clone()),
            (Some(text), ValueEncoding::Json) => {
                serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone()))
            }
        }
    }

    pub fn encoding(&self) -> ValueEncoding {
        self.encoding
    }

    pub fn entry_type(&self) -> Option<ProfileType> {
        self.entry_type
    }

    pub fn updated(&self) -> DateTime<Utc> {
        self.updated
    }

    /// Replace the value; an already fixed type is kept
    pub fn set_value(&mut self, value: Option<String>, encoding: ValueEncoding) {
        self.value = value;
        self.encoding = encoding;
        self.updated = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_table() {
        assert_eq!(ProfileType::infer("bio"), Some(ProfileType::Markdown));
        assert_eq!(ProfileType::infer("nickname"), Some(ProfileType::Text));
        assert_eq!(ProfileType::infer("timezone"), None);
    }

    #[test]
    fn test_type_survives_value_change() {
        let uuid = UserUuid::generate();
        let mut entry =
            ProfileEntry::new(uuid.clone(), "bio", Some("# Hi".to_string()), ValueEncoding::Text);
        assert_eq!(entry.entry_type(), Some(ProfileType::Markdown));
        assert_eq!(entry.key().as_str(), format!("{uuid}:bio"));

        entry.set_value(Some("plain now".to_string()), ValueEncoding::Text);
        assert_eq!(entry.entry_type(), Some(ProfileType::Markdown));
        assert_eq!(entry.value(), Some("plain now"));
    }

    #[test]
    fn test_encode_scalar() {
        assert_eq!(ProfileValue::Scalar("hello".into()).encode().unwrap(), Some("hello".into()));
        assert_eq!(ProfileValue::Scalar("  ".into()).encode().unwrap(), None);
        assert_eq!(ProfileValue::Scalar("0".into()).encode().unwrap(), Some("0".into()));
    }

    #[test]
    fn test_encode_structured_is_pretty() {
        let encoded = ProfileValue::Structured(json!(["a", "b"])).encode().unwrap().unwrap();
        assert_eq!(encoded, "[\n  \"a\",\n  \"b\"\n]");
        assert_eq!(ProfileValue::Structured(json!([])).encode().unwrap(), None);
    }

    #[test]
    fn test_encode_raw() {
        assert_eq!(ProfileValue::Raw(json!({"a": 1})).encode().unwrap(), Some("{\"a\":1}".into()));
        assert_eq!(ProfileValue::Raw(json!("text")).encode().unwrap(), Some("text".into()));
        assert_eq!(ProfileValue::Raw(json!(0)).encode().unwrap(), Some("0".into()));
        assert_eq!(ProfileValue::Raw(Value::Null).encode().unwrap(), None);
    }

    #[test]
    fn test_decoded_restores_structure() {
        let uuid = UserUuid::generate();
        let links = ProfileValue::Structured(json!(["a", "b"]));
        let entry = ProfileEntry::new(uuid.clone(), "links", links.encode().unwrap(), links.encoding());
        assert_eq!(entry.decoded(), json!(["a", "b"]));

        let age = ProfileValue::Raw(json!(0));
        let entry = ProfileEntry::new(uuid.clone(), "age", age.encode().unwrap(), age.encoding());
        assert_eq!(entry.decoded(), json!(0));

        let text = ProfileValue::Raw(json!("[not json"));
        let entry = ProfileEntry::new(uuid.clone(), "note", text.encode().unwrap(), text.encoding());
        assert_eq!(entry.decoded(), json!("[not json"));

        let empty = ProfileEntry::new(uuid, "bio", None, ValueEncoding::Json);
        assert_eq!(empty.decoded(), Value::Null);
    }

    #[test]
    fn test_entries_without_encoding_read_as_text() {
        let uuid = UserUuid::generate();
        let entry = ProfileEntry::new(uuid, "links", Some("[1]".to_string()), ValueEncoding::Json);
        let mut stored = serde_json::to_value(&entry).unwrap();
        stored.as_object_mut().unwrap().remove("encoding");

        let restored: ProfileEntry = serde_json::from_value(stored).unwrap();
        assert_eq!(restored.encoding(), ValueEncoding::Text);
        assert_eq!(restored.decoded(), json!("[1]"));
    }

    #[test]
    fn test_profile_value_wire_shape() {
        let value: ProfileValue =
            serde_json::from_value(json!({"kind": "structured", "value": {"x": true}})).unwrap();
        assert_eq!(value, ProfileValue::Structured(json!({"x": true})));
    }
}

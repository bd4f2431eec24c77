//! Per-user key/value profile store

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::domain::profile::{ProfileEntry, ProfileEntryKey, ProfileValue, MAX_PROFILE_KEY_LENGTH};
use crate::domain::storage::Storage;
use crate::domain::user::UserUuid;
use crate::domain::DomainError;

/// Key to on-disk value; absent or emptied keys map to `None`
pub type ProfileData = BTreeMap<String, Option<String>>;

/// Key to decoded value; absent or emptied keys map to `null`
pub type ProfileView = BTreeMap<String, Value>;

/// Profile attributes keyed by `(uuid, key)`
#[derive(Debug, Clone)]
pub struct ProfileDataStore {
    storage: Arc<dyn Storage<ProfileEntry>>,
}

impl ProfileDataStore {
    pub fn new(storage: Arc<dyn Storage<ProfileEntry>>) -> Self {
        Self { storage }
    }

    /// Every stored entry of a user when `keys` is empty, otherwise exactly the
    /// requested keys, decoded back to the submitted shape
    pub async fn get(&self, user_uuid: &UserUuid, keys: &[String]) -> Result<ProfileView, DomainError> {
        Ok(self
            .lookup(user_uuid, keys)
            .await?
            .into_iter()
            .map(|(key, entry)| (key, entry.map_or(Value::Null, |e| e.decoded())))
            .collect())
    }

    /// Same selection as [`get`](Self::get) in on-disk form
    pub async fn stored(&self, user_uuid: &UserUuid, keys: &[String]) -> Result<ProfileData, DomainError> {
        Ok(self
            .lookup(user_uuid, keys)
            .await?
            .into_iter()
            .map(|(key, entry)| (key, entry.and_then(|e| e.value().map(str::to_string))))
            .collect())
    }

    /// Upsert every entry as one batch and return the on-disk representation
    ///
    /// A bad key or a failed write leaves the stored profile untouched.
    pub async fn set(
        &self,
        user_uuid: &UserUuid,
        entries: BTreeMap<String, ProfileValue>,
    ) -> Result<ProfileData, DomainError> {
        let mut encoded = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            validate_key(&key)?;
            let encoding = value.encoding();
            encoded.push((key, value.encode()?, encoding));
        }

        let mut batch = Vec::with_capacity(encoded.len());
        for (key, value, encoding) in encoded {
            let entry = match self.entry(user_uuid, &key).await? {
                Some(mut existing) => {
                    existing.set_value(value, encoding);
                    existing
                }
                None => {
                    let entry = ProfileEntry::new(user_uuid.clone(), key.as_str(), value, encoding);
                    debug!(user_uuid = %user_uuid, key = %key, entry_type = ?entry.entry_type(), "Creating profile entry");
                    entry
                }
            };
            batch.push(entry);
        }

        Ok(self
            .storage
            .save_all(batch)
            .await?
            .into_iter()
            .map(|entry| (entry.name().to_string(), entry.value().map(str::to_string)))
            .collect())
    }

    pub async fn entry(&self, user_uuid: &UserUuid, key: &str) -> Result<Option<ProfileEntry>, DomainError> {
        self.storage.get(&ProfileEntryKey::new(user_uuid, key)).await
    }

    /// Entries of a user in insertion order
    pub async fn entries(&self, user_uuid: &UserUuid) -> Result<Vec<ProfileEntry>, DomainError> {
        self.storage.find_by_text("user_uuid", user_uuid.as_str()).await
    }

    async fn lookup(
        &self,
        user_uuid: &UserUuid,
        keys: &[String],
    ) -> Result<Vec<(String, Option<ProfileEntry>)>, DomainError> {
        if keys.is_empty() {
            return Ok(self
                .entries(user_uuid)
                .await?
                .into_iter()
                .map(|entry| (entry.name().to_string(), Some(entry)))
                .collect());
        }

        let mut found = Vec::with_capacity(keys.len());
        for key in keys {
            found.push((key.clone(), self.entry(user_uuid, key).await?));
        }
        Ok(found)
    }
}

fn validate_key(key: &str) -> Result<(), DomainError> {
    if key.trim().is_empty() {
        return Err(DomainError::validation("Profile key cannot be empty"));
    }
    if key.chars().count() > MAX_PROFILE_KEY_LENGTH {
        return Err(DomainError::validation(format!(
            "Profile key cannot exceed {} characters",
            MAX_PROFILE_KEY_LENGTH
        )));
    }
    Ok(())
}

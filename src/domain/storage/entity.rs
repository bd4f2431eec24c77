//! Storage entity traits

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};

/// Trait for types that can be used as storage keys
pub trait StorageKey: Clone + Debug + Send + Sync + Eq + std::hash::Hash {
    /// Returns the key as a string for storage backends that require string keys
    fn as_str(&self) -> &str;
}

/// Trait for records persisted through a [`Storage`](super::Storage) backend
pub trait StorageEntity: Clone + Debug + Send + Sync + Serialize + DeserializeOwned {
    /// The key type for this entity
    type Key: StorageKey;

    /// Returns the entity's key
    fn key(&self) -> &Self::Key;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    struct NoteKey(String);

    impl StorageKey for NoteKey {
        fn as_str(&self) -> &str {
            &self.0
        }
    }

    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    struct Note {
        key: NoteKey,
        body: String,
    }

    impl StorageEntity for Note {
        type Key = NoteKey;

        fn key(&self) -> &Self::Key {
            &self.key
        }
    }

    #[test]
    fn test_entity_key_round_trips_as_str() {
        let note = Note {
            key: NoteKey("note-1".to_string()),
            body: "hello".to_string(),
        };
        assert_eq!(note.key().as_str(), "note-1");
        assert_eq!(note.body, "hello");
    }
}

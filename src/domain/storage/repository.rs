//! Storage trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

use super::entity::{StorageEntity, StorageKey};

/// Generic record repository shared by users, profile entries and audit rows
#[async_trait]
pub trait Storage<E>: Send + Sync + Debug
where
    E: StorageEntity + 'static,
{
    /// Retrieves an entity by its key
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError>;

    /// Retrieves all entities in insertion order
    async fn list(&self) -> Result<Vec<E>, DomainError>;

    /// Creates a new entity, returns error if already exists
    async fn create(&self, entity: E) -> Result<E, DomainError>;

    /// Updates an existing entity, returns error if not found
    async fn update(&self, entity: E) -> Result<E, DomainError>;

    /// Saves an entity (creates if not exists, updates if exists)
    async fn save(&self, entity: E) -> Result<E, DomainError> {
        if self.exists(entity.key()).await? {
            self.update(entity).await
        } else {
            self.create(entity).await
        }
    }

    /// Creates or updates every entity as one unit; on error nothing is stored
    async fn save_all(&self, entities: Vec<E>) -> Result<Vec<E>, DomainError>;

    /// Checks if an entity exists by its key
    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Returns the count of entities
    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.list().await?.len())
    }

    /// Entities whose top-level text `field` equals `value`, ignoring ASCII case,
    /// in insertion order
    async fn find_by_text(&self, field: &str, value: &str) -> Result<Vec<E>, DomainError> {
        let mut matches = Vec::new();
        for entity in self.list().await? {
            let data = serde_json::to_value(&entity).map_err(|e| {
                DomainError::storage(format!("Failed to serialize entity: {}", e))
            })?;
            if data
                .get(field)
                .and_then(|v| v.as_str())
                .is_some_and(|v| v.eq_ignore_ascii_case(value))
            {
                matches.push(entity);
            }
        }
        Ok(matches)
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Mock storage for testing with injectable failures
    ///
    /// `with_error` fails every call, `with_write_error` lets reads through and
    /// fails writes only. `with_write_limit(n)` lets the first `n` entity
    /// writes through and fails the rest.
    #[derive(Debug)]
    pub struct MockStorage<E>
    where
        E: StorageEntity,
    {
        entities: Mutex<Vec<E>>,
        error: Mutex<Option<String>>,
        write_error: Mutex<Option<String>>,
        write_limit: Mutex<Option<usize>>,
        writes: Mutex<usize>,
    }

    impl<E> Default for MockStorage<E>
    where
        E: StorageEntity,
    {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<E> MockStorage<E>
    where
        E: StorageEntity,
    {
        pub fn new() -> Self {
            Self {
                entities: Mutex::new(Vec::new()),
                error: Mutex::new(None),
                write_error: Mutex::new(None),
                write_limit: Mutex::new(None),
                writes: Mutex::new(0),
            }
        }

        pub fn with_entity(self, entity: E) -> Self {
            self.entities.lock().unwrap().push(entity);
            self
        }

        pub fn with_error(self, error: impl Into<String>) -> Self {
            *self.error.lock().unwrap() = Some(error.into());
            self
        }

        pub fn with_write_error(self, error: impl Into<String>) -> Self {
            *self.write_error.lock().unwrap() = Some(error.into());
            self
        }

        pub fn with_write_limit(self, limit: usize) -> Self {
            *self.write_limit.lock().unwrap() = Some(limit);
            self
        }

        pub fn set_write_error(&self, error: Option<String>) {
            *self.write_error.lock().unwrap() = error;
        }

        fn check_error(&self) -> Result<(), DomainError> {
            if let Some(error) = self.error.lock().unwrap().clone() {
                return Err(DomainError::storage(error));
            }
            Ok(())
        }

        fn check_write_error(&self) -> Result<(), DomainError> {
            self.check_error()?;
            if let Some(error) = self.write_error.lock().unwrap().clone() {
                return Err(DomainError::storage(error));
            }

            let mut writes = self.writes.lock().unwrap();
            if self.write_limit.lock().unwrap().is_some_and(|limit| *writes >= limit) {
                return Err(DomainError::storage("write limit reached"));
            }
            *writes += 1;
            Ok(())
        }

        fn position(entities: &[E], key: &E::Key) -> Option<usize> {
            entities.iter().position(|e| e.key() == key)
        }
    }

    #[async_trait]
    impl<E> Storage<E> for MockStorage<E>
    where
        E: StorageEntity + 'static,
    {
        async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
            self.check_error()?;
            let entities = self.entities.lock().unwrap();
            Ok(Self::position(&entities, key).map(|i| entities[i].clone()))
        }

        async fn list(&self) -> Result<Vec<E>, DomainError> {
            self.check_error()?;
            Ok(self.entities.lock().unwrap().clone())
        }

        async fn create(&self, entity: E) -> Result<E, DomainError> {
            self.check_write_error()?;
            let mut entities = self.entities.lock().unwrap();

            if Self::position(&entities, entity.key()).is_some() {
                return Err(DomainError::conflict(format!(
                    "Entity with key '{}' already exists",
                    entity.key().as_str()
                )));
            }

            entities.push(entity.clone());
            Ok(entity)
        }

        async fn update(&self, entity: E) -> Result<E, DomainError> {
            self.check_write_error()?;
            let mut entities = self.entities.lock().unwrap();

            match Self::position(&entities, entity.key()) {
                Some(i) => {
                    entities[i] = entity.clone();
                    Ok(entity)
                }
                None => Err(DomainError::not_found(format!(
                    "Entity with key '{}' not found",
                    entity.key().as_str()
                ))),
            }
        }

        async fn save_all(&self, entities: Vec<E>) -> Result<Vec<E>, DomainError> {
            // every write must be admitted before any row changes
            for _ in &entities {
                self.check_write_error()?;
            }

            let mut rows = self.entities.lock().unwrap();
            for entity in &entities {
                match Self::position(&rows, entity.key()) {
                    Some(i) => rows[i] = entity.clone(),
                    None => rows.push(entity.clone()),
                }
            }
            Ok(entities)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use serde::{Deserialize, Serialize};

        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        struct RowKey(String);

        impl StorageKey for RowKey {
            fn as_str(&self) -> &str {
                &self.0
            }
        }

        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        struct Row {
            key: RowKey,
            value: String,
        }

        impl StorageEntity for Row {
            type Key = RowKey;

            fn key(&self) -> &Self::Key {
                &self.key
            }
        }

        fn row(key: &str, value: &str) -> Row {
            Row {
                key: RowKey(key.to_string()),
                value: value.to_string(),
            }
        }

        #[tokio::test]
        async fn test_mock_storage_save_all_is_all_or_nothing() {
            let storage: MockStorage<Row> = MockStorage::new().with_write_limit(2);
            storage.create(row("1", "first")).await.unwrap();

            let result = storage
                .save_all(vec![row("1", "changed"), row("2", "new")])
                .await;

            assert!(matches!(result, Err(DomainError::Storage { .. })));
            assert_eq!(storage.list().await.unwrap(), vec![row("1", "first")]);
        }

        #[tokio::test]
        async fn test_mock_storage_save_creates_then_updates() {
            let storage: MockStorage<Row> = MockStorage::new();

            storage.save(row("1", "first")).await.unwrap();
            storage.save(row("1", "second")).await.unwrap();

            let stored = storage.get(&RowKey("1".to_string())).await.unwrap();
            assert_eq!(stored.unwrap().value, "second");
            assert_eq!(storage.count().await.unwrap(), 1);
        }

        #[tokio::test]
        async fn test_mock_storage_create_conflict() {
            let storage: MockStorage<Row> = MockStorage::new().with_entity(row("1", "a"));

            let result = storage.create(row("1", "b")).await;
            assert!(matches!(result, Err(DomainError::Conflict { .. })));
        }

        #[tokio::test]
        async fn test_mock_storage_update_not_found() {
            let storage: MockStorage<Row> = MockStorage::new();

            let result = storage.update(row("1", "a")).await;
            assert!(matches!(result, Err(DomainError::NotFound { .. })));
        }

        #[tokio::test]
        async fn test_mock_storage_list_keeps_insertion_order() {
            let storage: MockStorage<Row> = MockStorage::new();
            storage.create(row("b", "1")).await.unwrap();
            storage.create(row("a", "2")).await.unwrap();

            let keys: Vec<String> = storage
                .list()
                .await
                .unwrap()
                .into_iter()
                .map(|r| r.key.0)
                .collect();
            assert_eq!(keys, vec!["b", "a"]);
        }

        #[tokio::test]
        async fn test_find_by_text_ignores_case() {
            let storage: MockStorage<Row> = MockStorage::new()
                .with_entity(row("1", "Ada"))
                .with_entity(row("2", "grace"))
                .with_entity(row("3", "ada"));

            let found = storage.find_by_text("value", "ADA").await.unwrap();
            let keys: Vec<String> = found.into_iter().map(|r| r.key.0).collect();
            assert_eq!(keys, vec!["1", "3"]);
        }

        #[tokio::test]
        async fn test_mock_storage_error() {
            let storage: MockStorage<Row> = MockStorage::new().with_error("Test error");

            let result = storage.get(&RowKey("1".to_string())).await;
            assert!(matches!(result, Err(DomainError::Storage { .. })));
        }

        #[tokio::test]
        async fn test_mock_storage_write_error_allows_reads() {
            let storage: MockStorage<Row> = MockStorage::new()
                .with_entity(row("1", "a"))
                .with_write_error("disk full");

            assert!(storage.get(&RowKey("1".to_string())).await.unwrap().is_some());
            assert!(storage.update(row("1", "b")).await.is_err());

            storage.set_write_error(None);
            assert!(storage.update(row("1", "b")).await.is_ok());
        }
    }
}

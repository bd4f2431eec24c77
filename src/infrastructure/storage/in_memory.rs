//! In-memory storage implementation

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::storage::{Storage, StorageEntity, StorageKey};
use crate::domain::DomainError;

#[derive(Debug)]
struct Rows<E> {
    entities: Vec<E>,
    index: HashMap<String, usize>,
}

/// Thread-safe in-memory storage that keeps insertion order
///
/// Used for development and tests. Data is lost when the process terminates.
#[derive(Debug)]
pub struct InMemoryStorage<E>
where
    E: StorageEntity,
{
    rows: RwLock<Rows<E>>,
}

impl<E> Default for InMemoryStorage<E>
where
    E: StorageEntity,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> InMemoryStorage<E>
where
    E: StorageEntity,
{
    /// Creates a new empty in-memory storage
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Rows {
                entities: Vec::new(),
                index: HashMap::new(),
            }),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Rows<E>>, DomainError> {
        self.rows
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Rows<E>>, DomainError> {
        self.rows
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))
    }
}

#[async_trait]
impl<E> Storage<E> for InMemoryStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        let rows = self.read()?;
        Ok(rows
            .index
            .get(key.as_str())
            .map(|&i| rows.entities[i].clone()))
    }

    async fn list(&self) -> Result<Vec<E>, DomainError> {
        Ok(self.read()?.entities.clone())
    }

    async fn create(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let mut rows = self.write()?;

        if rows.index.contains_key(&key) {
            return Err(DomainError::conflict(format!(
                "Entity with key '{}' already exists",
                key
            )));
        }

        let position = rows.entities.len();
        rows.entities.push(entity.clone());
        rows.index.insert(key, position);
        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let mut rows = self.write()?;

        let Some(&position) = rows.index.get(&key) else {
            return Err(DomainError::not_found(format!(
                "Entity with key '{}' not found",
                key
            )));
        };

        rows.entities[position] = entity.clone();
        Ok(entity)
    }

    async fn save_all(&self, entities: Vec<E>) -> Result<Vec<E>, DomainError> {
        let mut guard = self.write()?;
        let rows = &mut *guard;

        for entity in &entities {
            let key = entity.key().as_str();
            match rows.index.get(key).copied() {
                Some(position) => rows.entities[position] = entity.clone(),
                None => {
                    rows.index.insert(key.to_string(), rows.entities.len());
                    rows.entities.push(entity.clone());
                }
            }
        }
        Ok(entities)
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.read()?.entities.len())
    }

    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.read()?.index.contains_key(key.as_str()))
    }
}

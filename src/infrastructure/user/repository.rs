//! Storage-backed user repository implementation

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::storage::Storage;
use crate::domain::user::{User, UserRepository, UserUuid};
use crate::domain::DomainError;

/// Storage-backed implementation of UserRepository
#[derive(Debug)]
pub struct StorageUserRepository {
    storage: Arc<dyn Storage<User>>,
}

impl StorageUserRepository {
    pub fn new(storage: Arc<dyn Storage<User>>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl UserRepository for StorageUserRepository {
    async fn get(&self, uuid: &UserUuid) -> Result<Option<User>, DomainError> {
        self.storage.get(uuid).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let email = email.trim();
        if email.is_empty() {
            return Ok(None);
        }
        Ok(self.storage.find_by_text("email", email).await?.into_iter().next())
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        self.storage.create(user).await
    }

    async fn update(&self, user: User) -> Result<User, DomainError> {
        self.storage.update(user).await
    }

    async fn count(&self) -> Result<usize, DomainError> {
        self.storage.count().await
    }
}

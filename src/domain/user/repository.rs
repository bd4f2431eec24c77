//! User repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{User, UserUuid};
use crate::domain::DomainError;

/// Repository trait for user records, keyed by public uuid
#[async_trait]
pub trait UserRepository: Send + Sync + Debug {
    /// Get a user by their public uuid
    async fn get(&self, uuid: &UserUuid) -> Result<Option<User>, DomainError>;

    /// Get a user by email, compared case-insensitively
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Create a new user
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Overwrite an existing user
    async fn update(&self, user: User) -> Result<User, DomainError>;

    /// Count all users
    async fn count(&self) -> Result<usize, DomainError>;

    /// Check whether an email is held by an account other than `except`
    async fn email_taken(
        &self,
        email: &str,
        except: Option<&UserUuid>,
    ) -> Result<bool, DomainError> {
        Ok(self
            .get_by_email(email)
            .await?
            .is_some_and(|holder| Some(holder.uuid()) != except))
    }
}

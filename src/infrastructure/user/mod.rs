//! User infrastructure module
//!
//! Argon2 credential hashing, the storage-backed repository and the account
//! lifecycle service.

mod password;
mod repository;
mod service;

pub use password::{Argon2Hasher, CredentialHasher};
pub use repository::StorageUserRepository;
pub use service::{DeleteOutcome, LoginOutcome, Projection, UserAccountService};

//! Domain layer - Account types, policies and repository traits

pub mod access;
pub mod audit;
pub mod error;
pub mod profile;
pub mod storage;
pub mod user;

pub use access::{FieldAccessPolicy, ReadOptions, ReadView, Requester, Role, WriteOperation};
pub use audit::{AuditEntry, AuditEntryId, AuditEvent, AuditLog};
pub use error::{AccountError, DomainError};
pub use profile::{ProfileEntry, ProfileEntryKey, ProfileType, ProfileValue};
pub use storage::{Storage, StorageEntity, StorageKey};
pub use user::{
    LoginDenial, Scopes, User, UserField, UserRepository, UserStatus, UserUuid, ValidationEngine,
    ValidationErrors, ValidationRule, Violation,
};

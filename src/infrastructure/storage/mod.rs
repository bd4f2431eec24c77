//! Storage infrastructure - Storage implementations

mod factory;
mod in_memory;
mod postgres;

pub use factory::{
    StorageConfig, StorageFactory, StorageType, AUDIT_TABLE, PROFILE_TABLE, USERS_TABLE,
};
pub use in_memory::InMemoryStorage;
pub use postgres::{PostgresConfig, PostgresStorage};

//! Infrastructure layer - Storage, hashing, auditing and the account service

pub mod audit;
pub mod auth;
pub mod logging;
pub mod profile;
pub mod storage;
pub mod user;

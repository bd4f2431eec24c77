//! Audit infrastructure

mod storage_log;

pub use storage_log::StorageAuditLog;

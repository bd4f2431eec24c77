use thiserror::Error;

use crate::domain::user::ValidationErrors;

/// Core domain errors raised by storage and infrastructure collaborators
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid ID format: {message}")]
    InvalidId { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_id(message: impl Into<String>) -> Self {
        Self::InvalidId {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

/// Failure of an account operation, as surfaced to the boundary layer
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Persistence failure: {0}")]
    Persistence(#[source] DomainError),

    /// The change was committed but its audit entry could not be appended
    #[error("Audit write failed after commit: {0}")]
    AuditWrite(#[source] DomainError),

    #[error("Credential failure: {0}")]
    Credential(#[source] DomainError),
}

impl AccountError {
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied {
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }
}

impl From<ValidationErrors> for AccountError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<DomainError> for AccountError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Validation { message } | DomainError::InvalidId { message } => {
                Self::InvalidRequest { message }
            }
            other => Self::Persistence(other),
        }
    }
}

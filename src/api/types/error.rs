//! Structured API errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domain::user::{LoginDenial, Violation};
use crate::domain::{AccountError, DomainError};

/// Error categories reported in the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    InvalidRequestError,
    AuthenticationError,
    PermissionError,
    ServerError,
}

impl std::fmt::Display for ApiErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequestError => write!(f, "invalid_request_error"),
            Self::AuthenticationError => write!(f, "authentication_error"),
            Self::PermissionError => write!(f, "permission_error"),
            Self::ServerError => write!(f, "server_error"),
        }
    }
}

/// OAuth-style error tokens carried in `code`
pub mod codes {
    pub const ACCESS_DENIED: &str = "access_denied";
    pub const INVALID_REQUEST: &str = "invalid_request";
    pub const INVALID_TOKEN: &str = "invalid_token";
    pub const SERVER_ERROR: &str = "server_error";
    pub const AUDIT_WRITE_FAILED: &str = "audit_write_failed";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: ApiErrorType,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<Violation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial: Option<LoginDenial>,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        error_type: ApiErrorType,
        code: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ApiErrorDetail {
                    message: message.into(),
                    error_type,
                    code: code.to_string(),
                    violations: None,
                    denial: None,
                },
            },
        }
    }

    pub fn with_violations(mut self, violations: Vec<Violation>) -> Self {
        self.response.error.violations = Some(violations);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ApiErrorType::InvalidRequestError,
            codes::INVALID_REQUEST,
            message,
        )
    }

    /// Missing or unusable bearer token
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            ApiErrorType::AuthenticationError,
            codes::INVALID_TOKEN,
            message,
        )
    }

    /// Role or ownership mismatch
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            ApiErrorType::PermissionError,
            codes::ACCESS_DENIED,
            message,
        )
    }

    /// Login refused with an explicit reason
    pub fn login_denied(denial: LoginDenial) -> Self {
        let mut err = Self::new(
            StatusCode::UNAUTHORIZED,
            ApiErrorType::AuthenticationError,
            codes::ACCESS_DENIED,
            denial.to_string(),
        );
        err.response.error.denial = Some(denial);
        err
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorType::ServerError,
            codes::SERVER_ERROR,
            message,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::AccessDenied { message } => Self::access_denied(message),
            AccountError::Validation(errors) => {
                let message = format!("Validation failed: {errors}");
                Self::bad_request(message).with_violations(errors.into_iter().collect())
            }
            AccountError::InvalidRequest { message } => Self::bad_request(message),
            AccountError::AuditWrite(source) => {
                error!(error = %source, "Change committed but audit entry was not written");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorType::ServerError,
                    codes::AUDIT_WRITE_FAILED,
                    "Change committed but the audit entry could not be written",
                )
            }
            AccountError::Persistence(source) | AccountError::Credential(source) => {
                error!(error = %source, "Account operation failed");
                Self::internal("Internal server error")
            }
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        AccountError::from(err).into()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.response.error.error_type, self.response.error.message
        )
    }
}

impl std::error::Error for ApiError {}

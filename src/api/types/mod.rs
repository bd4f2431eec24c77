//! Request and response types shared by the handlers

mod error;
mod json;

pub use error::{codes, ApiError, ApiErrorDetail, ApiErrorResponse, ApiErrorType};
pub use json::Json;

//! User domain
//!
//! Account record, its static schema descriptor, the validation engine and the
//! repository trait.

mod entity;
mod repository;
mod schema;
mod validation;

pub use entity::{
    format_timestamp, LoginDenial, Scopes, User, UserStatus, UserUuid, ADMIN_SCOPE, USER_SCOPE,
};
pub use repository::UserRepository;
pub use schema::{FieldDescriptor, FieldKind, ProtectionTier, UserField, USER_SCHEMA};
pub use validation::{
    is_blank, is_valid_email, ValidationEngine, ValidationErrors, ValidationRule, Violation,
    MAX_PASSWORD_LENGTH, MAX_TEXT_LENGTH, MIN_PASSWORD_LENGTH,
};

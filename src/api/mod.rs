//! HTTP boundary
//!
//! Resolves the caller from a bearer token, hands parsed input to the account
//! service and renders its projections or structured errors.

pub mod auth;
pub mod health;
pub mod middleware;
pub mod router;
pub mod state;
pub mod types;
pub mod users;

pub use middleware::RequireCaller;
pub use router::create_router;
pub use state::{AccountService, AppState};

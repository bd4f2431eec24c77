//! Application state for shared services

use std::sync::Arc;

use crate::infrastructure::auth::JwtGenerator;
use crate::infrastructure::user::{Argon2Hasher, StorageUserRepository, UserAccountService};

/// Account service as wired by the binary
pub type AccountService = UserAccountService<StorageUserRepository, Argon2Hasher>;

/// Application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub jwt_service: Arc<dyn JwtGenerator>,
}

impl AppState {
    pub fn new(accounts: Arc<AccountService>, jwt_service: Arc<dyn JwtGenerator>) -> Self {
        Self {
            accounts,
            jwt_service,
        }
    }
}

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::auth;
use super::health;
use super::state::AppState;
use super::users;

/// Create the full router with application state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        // Session endpoints (no auth required for login)
        .nest("/auth", auth::create_auth_router())
        // Accounts and profile data
        .merge(users::create_users_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

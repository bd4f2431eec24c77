//! Session endpoints
//!
//! Login verifies an email/credential pair, records the login and issues a
//! JWT. Logout records the event; the token itself is discarded client-side.

use axum::{extract::State, routing::post, Router};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::api::middleware::RequireCaller;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::user::format_timestamp;
use crate::infrastructure::user::{LoginOutcome, Projection};

pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Projection,
    pub expires_at: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = match state
        .accounts
        .authenticate(&request.email, &request.password)
        .await?
    {
        LoginOutcome::Success(user) => user,
        LoginOutcome::Denied(denial) => return Err(ApiError::login_denied(denial)),
    };

    let token = state.jwt_service.generate(&user)?;
    let expires_at = Utc::now() + Duration::hours(state.jwt_service.expiration_hours() as i64);

    Ok(Json(LoginResponse {
        token,
        user: user.exported_fields(),
        expires_at: format_timestamp(expires_at),
    }))
}

/// POST /auth/logout
pub async fn logout(
    RequireCaller { user, .. }: RequireCaller,
    State(state): State<AppState>,
) -> Result<Json<LogoutResponse>, ApiError> {
    state.accounts.logout(user.uuid()).await?;

    Ok(Json(LogoutResponse {
        message: "Logged out successfully".to_string(),
    }))
}

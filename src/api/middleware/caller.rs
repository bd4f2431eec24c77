//! Caller identity resolved from a bearer JWT

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::{debug, warn};

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::{Requester, User};

/// Extractor that requires a valid JWT whose subject is a usable account
///
/// The role is derived from the scopes stored on the account, not from the
/// token, so a scope change takes effect on the next request.
#[derive(Debug, Clone)]
pub struct RequireCaller {
    pub user: User,
    pub requester: Requester,
}

impl FromRequestParts<AppState> for RequireCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_jwt_token(&parts.headers)?;

        debug!("Validating JWT token");

        let claims = state
            .jwt_service
            .validate(&token)
            .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;
        let uuid = claims
            .user_uuid()
            .map_err(|_| ApiError::unauthorized("Invalid token subject"))?;

        let user = state
            .accounts
            .find(&uuid)
            .await?
            .ok_or_else(|| ApiError::unauthorized("User not found"))?;

        if let Some(denial) = user.login_denial() {
            warn!(uuid = %uuid, reason = %denial, "Rejected token for unusable account");
            return Err(ApiError::login_denied(denial));
        }

        let requester = Requester::for_user(&user);
        Ok(RequireCaller { user, requester })
    }
}

/// Extract the JWT from `Authorization: Bearer <token>`
pub fn extract_jwt_token(headers: &HeaderMap) -> Result<String, ApiError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid Authorization header encoding"))?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(token.trim().to_string());
        }
    }

    Err(ApiError::unauthorized(
        "Authentication required. Provide JWT token via 'Authorization: Bearer <token>' header",
    ))
}

//! User account and profile endpoints
//!
//! Handlers only translate between HTTP and [`UserAccountService`] calls.
//! An absent target is not an error here: reads answer `null`, deletes answer
//! `{"deleted": false}`.
//!
//! [`UserAccountService`]: crate::infrastructure::user::UserAccountService

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::api::middleware::RequireCaller;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::{ProfileValue, ReadOptions, ReadView, UserUuid, WriteOperation};
use crate::infrastructure::profile::{ProfileData, ProfileView};
use crate::infrastructure::user::{DeleteOutcome, Projection};

pub fn create_users_router() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route(
            "/users/{uuid}",
            get(get_user)
                .patch(merge_user)
                .put(replace_user)
                .delete(delete_user),
        )
        .route("/users/{uuid}/profile", get(get_profile).put(update_profile))
}

/// `?fields=email,status&view=admin`
#[derive(Debug, Default, Deserialize)]
pub struct ReadQuery {
    pub fields: Option<String>,
    pub view: Option<ReadView>,
}

impl ReadQuery {
    fn into_options(self) -> ReadOptions {
        ReadOptions {
            view: self.view.unwrap_or_default(),
            fields: split_list(self.fields.as_deref()),
        }
    }
}

/// `?keys=bio,nickname`
#[derive(Debug, Default, Deserialize)]
pub struct ProfileQuery {
    pub keys: Option<String>,
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn parse_uuid(raw: &str) -> Result<UserUuid, ApiError> {
    Ok(UserUuid::new(raw)?)
}

/// POST /users
pub async fn create_user(
    RequireCaller { requester, .. }: RequireCaller,
    State(state): State<AppState>,
    Query(query): Query<ReadQuery>,
    Json(input): Json<Map<String, Value>>,
) -> Result<(StatusCode, Json<Projection>), ApiError> {
    let projection = state
        .accounts
        .create(&requester, &input, &query.into_options())
        .await?;
    Ok((StatusCode::CREATED, Json(projection)))
}

/// GET /users/{uuid}
pub async fn get_user(
    RequireCaller { requester, .. }: RequireCaller,
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    Query(query): Query<ReadQuery>,
) -> Result<Json<Option<Projection>>, ApiError> {
    let target = parse_uuid(&uuid)?;
    let projection = state
        .accounts
        .get(&requester, &target, &query.into_options())
        .await?;
    Ok(Json(projection))
}

/// PATCH /users/{uuid}
pub async fn merge_user(
    caller: RequireCaller,
    state: State<AppState>,
    Path(uuid): Path<String>,
    Query(query): Query<ReadQuery>,
    Json(input): Json<Map<String, Value>>,
) -> Result<Json<Option<Projection>>, ApiError> {
    update_user(caller, state, &uuid, input, WriteOperation::Merge, query).await
}

/// PUT /users/{uuid}
pub async fn replace_user(
    caller: RequireCaller,
    state: State<AppState>,
    Path(uuid): Path<String>,
    Query(query): Query<ReadQuery>,
    Json(input): Json<Map<String, Value>>,
) -> Result<Json<Option<Projection>>, ApiError> {
    update_user(caller, state, &uuid, input, WriteOperation::Replace, query).await
}

async fn update_user(
    RequireCaller { requester, .. }: RequireCaller,
    State(state): State<AppState>,
    uuid: &str,
    input: Map<String, Value>,
    mode: WriteOperation,
    query: ReadQuery,
) -> Result<Json<Option<Projection>>, ApiError> {
    let target = parse_uuid(uuid)?;
    let projection = state
        .accounts
        .update(&requester, &target, &input, mode, &query.into_options())
        .await?;
    Ok(Json(projection))
}

/// DELETE /users/{uuid}
pub async fn delete_user(
    RequireCaller { requester, .. }: RequireCaller,
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Json<DeleteOutcome>, ApiError> {
    let target = parse_uuid(&uuid)?;
    let outcome = state
        .accounts
        .delete(&requester, &target)
        .await?
        .unwrap_or(DeleteOutcome { deleted: false });
    Ok(Json(outcome))
}

/// GET /users/{uuid}/profile
pub async fn get_profile(
    RequireCaller { requester, .. }: RequireCaller,
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    Query(query): Query<ProfileQuery>,
) -> Result<Json<Option<ProfileView>>, ApiError> {
    let target = parse_uuid(&uuid)?;
    let keys = split_list(query.keys.as_deref());
    Ok(Json(state.accounts.profile(&requester, &target, &keys).await?))
}

/// PUT /users/{uuid}/profile
pub async fn update_profile(
    RequireCaller { requester, .. }: RequireCaller,
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    Json(entries): Json<BTreeMap<String, ProfileValue>>,
) -> Result<Json<Option<ProfileData>>, ApiError> {
    let target = parse_uuid(&uuid)?;
    let stored = state
        .accounts
        .update_profile(&requester, &target, entries)
        .await?;
    Ok(Json(stored))
}

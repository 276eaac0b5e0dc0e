//! Account and follow-graph endpoints

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::User;
use crate::error::AppError;
use crate::service::AccountService;

use super::dto::*;

fn account_service(state: &AppState) -> AccountService {
    AccountService::new(
        state.db.clone(),
        state.feed_cache.clone(),
        state.notifier.clone(),
    )
}

/// Profile update request; omitted fields are left unchanged
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCredentialsRequest {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

/// GET /api/v1/accounts/verify_credentials
pub async fn verify_credentials(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<UserResponse>, AppError> {
    let (user, counts) = account_service(&state).get_profile(&session.user_id).await?;
    Ok(Json(crate::api::user_to_response(&user, &counts)))
}

/// PATCH /api/v1/accounts/update_credentials
pub async fn update_credentials(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(request): Json<UpdateCredentialsRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let (user, counts) = account_service(&state)
        .update_profile(
            &session.user_id,
            request.display_name.as_deref(),
            request.bio.as_deref(),
            request.avatar_url.as_deref(),
        )
        .await?;
    Ok(Json(crate::api::user_to_response(&user, &counts)))
}

/// GET /api/v1/accounts/:id
pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let (user, counts) = account_service(&state).get_profile(&id).await?;
    Ok(Json(crate::api::user_to_response(&user, &counts)))
}

/// POST /api/v1/accounts/:id/follow
pub async fn follow_account(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<RelationshipResponse>, AppError> {
    account_service(&state).follow(&session.user_id, &id).await?;
    Ok(Json(RelationshipResponse { following: true }))
}

/// POST /api/v1/accounts/:id/unfollow
pub async fn unfollow_account(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<RelationshipResponse>, AppError> {
    account_service(&state)
        .unfollow(&session.user_id, &id)
        .await?;
    Ok(Json(RelationshipResponse { following: false }))
}

/// Build a user-list page from `limit + 1` fetched edges.
fn user_list_page(mut entries: Vec<(String, User)>, limit: usize) -> UserListResponse {
    let has_more = entries.len() > limit;
    if has_more {
        entries.truncate(limit);
    }
    let next_cursor = if has_more {
        entries.last().map(|(edge_id, _)| edge_id.clone())
    } else {
        None
    };

    UserListResponse {
        users: entries
            .iter()
            .map(|(_, user)| crate::api::user_to_summary(user))
            .collect(),
        pagination: PaginationInfo {
            has_more,
            next_cursor,
        },
    }
}

/// GET /api/v1/accounts/:id/followers
pub async fn get_followers(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<CursorParams>,
) -> Result<Json<UserListResponse>, AppError> {
    let limit = crate::api::clamp_page_size(&state, params.limit);
    let entries = account_service(&state)
        .followers_page(&id, params.cursor.as_deref(), limit + 1)
        .await?;
    Ok(Json(user_list_page(entries, limit)))
}

/// GET /api/v1/accounts/:id/following
pub async fn get_following(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<CursorParams>,
) -> Result<Json<UserListResponse>, AppError> {
    let limit = crate::api::clamp_page_size(&state, params.limit);
    let entries = account_service(&state)
        .following_page(&id, params.cursor.as_deref(), limit + 1)
        .await?;
    Ok(Json(user_list_page(entries, limit)))
}

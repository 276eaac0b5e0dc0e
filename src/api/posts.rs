//! Post, like, and comment endpoints

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use crate::AppState;
use crate::auth::{CurrentUser, MaybeUser};
use crate::data::{Comment, User};
use crate::error::AppError;
use crate::service::PostService;

use super::dto::*;

fn post_service(state: &AppState) -> PostService {
    PostService::new(
        state.db.clone(),
        state.feed_cache.clone(),
        state.notifier.clone(),
    )
}

/// Post creation request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub content: String,
    pub media_url: Option<String>,
}

/// Post update request
#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub content: String,
}

/// Comment creation request
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

/// POST /api/v1/posts
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(request): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    let item = post_service(&state)
        .create(
            &session.user_id,
            &request.content,
            request.media_url.as_deref(),
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(crate::api::feed_item_to_response(&item)),
    ))
}

/// GET /api/v1/posts/:id
pub async fn get_post(
    State(state): State<AppState>,
    MaybeUser(session): MaybeUser,
    Path(id): Path<String>,
) -> Result<Json<PostResponse>, AppError> {
    let viewer_id = session.as_ref().map(|s| s.user_id.as_str());
    let item = post_service(&state).decorated(&id, viewer_id).await?;
    Ok(Json(crate::api::feed_item_to_response(&item)))
}

/// PUT /api/v1/posts/:id
pub async fn update_post(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<PostResponse>, AppError> {
    let item = post_service(&state)
        .update(&session.user_id, &id, &request.content)
        .await?;
    Ok(Json(crate::api::feed_item_to_response(&item)))
}

/// DELETE /api/v1/posts/:id
pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    post_service(&state).delete(&session.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/accounts/:id/posts
pub async fn account_posts(
    State(state): State<AppState>,
    MaybeUser(session): MaybeUser,
    Path(id): Path<String>,
    Query(params): Query<CursorParams>,
) -> Result<Json<FeedResponse>, AppError> {
    let viewer_id = session.as_ref().map(|s| s.user_id.as_str());
    let limit = crate::api::clamp_page_size(&state, params.limit);

    let mut items = post_service(&state)
        .posts_by_author(&id, viewer_id, params.cursor.as_deref(), limit + 1)
        .await?;

    let has_more = items.len() > limit;
    if has_more {
        items.truncate(limit);
    }
    let next_cursor = if has_more {
        items.last().map(|item| item.post.id.clone())
    } else {
        None
    };

    Ok(Json(FeedResponse {
        posts: items
            .iter()
            .map(crate::api::feed_item_to_response)
            .collect(),
        pagination: PaginationInfo {
            has_more,
            next_cursor,
        },
    }))
}

/// POST /api/v1/posts/:id/like
pub async fn like_post(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<PostResponse>, AppError> {
    let item = post_service(&state).like(&session.user_id, &id).await?;
    Ok(Json(crate::api::feed_item_to_response(&item)))
}

/// POST /api/v1/posts/:id/unlike
pub async fn unlike_post(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<PostResponse>, AppError> {
    let item = post_service(&state).unlike(&session.user_id, &id).await?;
    Ok(Json(crate::api::feed_item_to_response(&item)))
}

/// Resolve comment authors in one batch, then convert.
async fn comments_to_responses(
    state: &AppState,
    comments: &[Comment],
) -> Result<Vec<CommentResponse>, AppError> {
    let mut author_ids: Vec<String> = comments
        .iter()
        .map(|comment| comment.author_id.clone())
        .collect();
    author_ids.sort();
    author_ids.dedup();

    let authors: HashMap<String, User> = state
        .db
        .get_users_by_ids(&author_ids)
        .await?
        .into_iter()
        .map(|user| (user.id.clone(), user))
        .collect();

    Ok(comments
        .iter()
        .filter_map(|comment| {
            authors
                .get(&comment.author_id)
                .map(|author| crate::api::comment_to_response(comment, author))
        })
        .collect())
}

/// GET /api/v1/posts/:id/comments
///
/// Comments page in thread order (oldest first).
pub async fn get_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<CursorParams>,
) -> Result<Json<CommentListResponse>, AppError> {
    let limit = crate::api::clamp_page_size(&state, params.limit);

    let mut comments = post_service(&state)
        .comments_page(&id, params.cursor.as_deref(), limit + 1)
        .await?;

    let has_more = comments.len() > limit;
    if has_more {
        comments.truncate(limit);
    }
    let next_cursor = if has_more {
        comments.last().map(|comment| comment.id.clone())
    } else {
        None
    };

    let responses = comments_to_responses(&state, &comments).await?;

    Ok(Json(CommentListResponse {
        comments: responses,
        pagination: PaginationInfo {
            has_more,
            next_cursor,
        },
    }))
}

/// POST /api/v1/posts/:id/comments
pub async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    let comment = post_service(&state)
        .comment(&session.user_id, &id, &request.content)
        .await?;

    let author = state
        .db
        .get_user(&session.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok((
        StatusCode::CREATED,
        Json(crate::api::comment_to_response(&comment, &author)),
    ))
}

/// DELETE /api/v1/comments/:id
pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    post_service(&state)
        .delete_comment(&session.user_id, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

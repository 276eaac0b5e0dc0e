//! Notification endpoints

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    response::Json,
};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::User;
use crate::error::AppError;

use super::dto::*;

/// GET /api/v1/notifications
pub async fn get_notifications(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Query(params): Query<CursorParams>,
) -> Result<Json<NotificationListResponse>, AppError> {
    let limit = crate::api::clamp_page_size(&state, params.limit);

    let mut notifications = state
        .db
        .get_notifications_page(&session.user_id, params.cursor.as_deref(), limit + 1)
        .await?;

    let has_more = notifications.len() > limit;
    if has_more {
        notifications.truncate(limit);
    }
    let next_cursor = if has_more {
        notifications.last().map(|notification| notification.id.clone())
    } else {
        None
    };

    // Resolve actors in one batch
    let mut actor_ids: Vec<String> = notifications
        .iter()
        .map(|notification| notification.actor_id.clone())
        .collect();
    actor_ids.sort();
    actor_ids.dedup();

    let actors: HashMap<String, User> = state
        .db
        .get_users_by_ids(&actor_ids)
        .await?
        .into_iter()
        .map(|user| (user.id.clone(), user))
        .collect();

    let responses = notifications
        .iter()
        .filter_map(|notification| {
            actors
                .get(&notification.actor_id)
                .map(|actor| crate::api::notification_to_response(notification, actor))
        })
        .collect();

    Ok(Json(NotificationListResponse {
        notifications: responses,
        pagination: PaginationInfo {
            has_more,
            next_cursor,
        },
    }))
}

/// POST /api/v1/notifications/:id/read
pub async fn mark_notification_read(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let marked = state
        .db
        .mark_notification_read(&session.user_id, &id)
        .await?;
    if !marked {
        return Err(AppError::NotFound);
    }

    Ok(Json(serde_json::json!({})))
}

/// POST /api/v1/notifications/read_all
pub async fn mark_all_read(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .db
        .mark_all_notifications_read(&session.user_id)
        .await?;

    Ok(Json(serde_json::json!({})))
}

/// GET /api/v1/notifications/unread_count
pub async fn get_unread_count(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<UnreadCountResponse>, AppError> {
    let count = state
        .db
        .count_unread_notifications(&session.user_id)
        .await?;

    Ok(Json(UnreadCountResponse { count }))
}

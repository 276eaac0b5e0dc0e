//! Home feed endpoint

use axum::{
    extract::{Query, State},
    response::Json,
};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::metrics::{
    DB_QUERIES_TOTAL, DB_QUERY_DURATION_SECONDS, HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUESTS_TOTAL,
};
use crate::service::FeedService;

use super::dto::*;

/// GET /api/v1/feed
///
/// One page of the viewer's reverse-chronological home feed.
/// `cursor` is the ID of the last item of the previous page;
/// `limit` is clamped into `[1, feed.max_page_size]`.
pub async fn home_feed(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Query(params): Query<CursorParams>,
) -> Result<Json<FeedResponse>, AppError> {
    // Start timing the request
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/api/v1/feed"])
        .start_timer();

    let service = FeedService::new(
        state.db.clone(),
        state.feed_cache.clone(),
        state.config.feed.default_page_size,
        state.config.feed.max_page_size,
    );
    let limit = service.clamp_limit(params.limit);

    let db_timer = DB_QUERY_DURATION_SECONDS
        .with_label_values(&["SELECT", "posts"])
        .start_timer();
    let page = service
        .home_feed(&session.user_id, params.cursor.as_deref(), limit)
        .await
        .map_err(|error| {
            tracing::error!(
                viewer_id = %session.user_id,
                cursor = ?params.cursor,
                limit,
                %error,
                "Failed to assemble home feed"
            );
            error
        })?;
    DB_QUERIES_TOTAL
        .with_label_values(&["SELECT", "posts"])
        .inc();
    db_timer.observe_duration();

    let response = FeedResponse {
        posts: page
            .items
            .iter()
            .map(crate::api::feed_item_to_response)
            .collect(),
        pagination: PaginationInfo {
            has_more: page.has_more,
            next_cursor: page.next_cursor.clone(),
        },
    };

    // Record successful request
    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/api/v1/feed", "200"])
        .inc();

    Ok(Json(response))
}

//! API layer
//!
//! HTTP handlers for:
//! - Auth (register/login)
//! - Accounts & follow graph
//! - Posts, likes, comments
//! - Home feed
//! - Notifications (REST + SSE)
//! - Metrics (Prometheus)

mod accounts;
mod auth;
mod converters;
mod dto;
mod feed;
pub mod metrics;
mod notifications;
mod posts;
mod streaming;

pub use converters::*;
pub use dto::*;

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use crate::AppState;

/// Create the versioned API router
///
/// Routes are split into public and authenticated endpoints.
/// Authentication is enforced by the `CurrentUser` extractor in handlers.
pub fn api_router() -> Router<AppState> {
    // Public endpoints (no authentication required)
    let public_routes = Router::new()
        // Registration and login
        .route("/v1/auth/register", post(auth::register))
        .route("/v1/auth/login", post(auth::login))
        // Public account and post views
        .route("/v1/accounts/:id", get(accounts::get_account))
        .route("/v1/accounts/:id/followers", get(accounts::get_followers))
        .route("/v1/accounts/:id/following", get(accounts::get_following))
        .route("/v1/accounts/:id/posts", get(posts::account_posts))
        .route("/v1/posts/:id", get(posts::get_post))
        .route("/v1/posts/:id/comments", get(posts::get_comments));

    // Authenticated endpoints (require valid token)
    let authenticated_routes = Router::new()
        // Accounts
        .route(
            "/v1/accounts/verify_credentials",
            get(accounts::verify_credentials),
        )
        .route(
            "/v1/accounts/update_credentials",
            patch(accounts::update_credentials),
        )
        .route("/v1/accounts/:id/follow", post(accounts::follow_account))
        .route(
            "/v1/accounts/:id/unfollow",
            post(accounts::unfollow_account),
        )
        // Posts
        .route("/v1/posts", post(posts::create_post))
        .route("/v1/posts/:id", put(posts::update_post))
        .route("/v1/posts/:id", delete(posts::delete_post))
        .route("/v1/posts/:id/like", post(posts::like_post))
        .route("/v1/posts/:id/unlike", post(posts::unlike_post))
        .route("/v1/posts/:id/comments", post(posts::create_comment))
        .route("/v1/comments/:id", delete(posts::delete_comment))
        // Home feed
        .route("/v1/feed", get(feed::home_feed))
        // Notifications
        .route("/v1/notifications", get(notifications::get_notifications))
        .route(
            "/v1/notifications/:id/read",
            post(notifications::mark_notification_read),
        )
        .route(
            "/v1/notifications/read_all",
            post(notifications::mark_all_read),
        )
        .route(
            "/v1/notifications/unread_count",
            get(notifications::get_unread_count),
        )
        // Streaming
        .route(
            "/v1/streaming/notifications",
            get(streaming::stream_notifications),
        );

    // Merge public and authenticated routes
    public_routes.merge(authenticated_routes)
}

pub use metrics::metrics_router;

/// Clamp a client-requested page size into `[1, feed.max_page_size]`,
/// defaulting to `feed.default_page_size`. Shared by every paginated
/// listing.
pub(crate) fn clamp_page_size(state: &AppState, requested: Option<usize>) -> usize {
    requested
        .unwrap_or(state.config.feed.default_page_size)
        .clamp(1, state.config.feed.max_page_size)
}

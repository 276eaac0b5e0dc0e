//! API response DTOs
//!
//! The wire format is camelCase JSON; these are the only shapes
//! that leave the server. Password hashes and emails of other users
//! never appear here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cursor/limit query parameters shared by all paginated listings
#[derive(Debug, Default, Deserialize)]
pub struct CursorParams {
    /// Opaque cursor: the ID of the last item of the previous page
    pub cursor: Option<String>,
    pub limit: Option<usize>,
}

/// Pagination envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

/// Compact author representation embedded in posts, comments,
/// and notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Full user profile response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: i64,
}

/// Post with engagement decoration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub content: String,
    pub media_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author: AuthorSummary,
    pub like_count: i64,
    pub comment_count: i64,
    pub viewer_has_liked: bool,
}

/// One feed page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedResponse {
    pub posts: Vec<PostResponse>,
    pub pagination: PaginationInfo,
}

/// Paginated user summaries (followers/following)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<AuthorSummary>,
    pub pagination: PaginationInfo,
}

/// Comment response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub post_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorSummary,
}

/// Paginated comments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentListResponse {
    pub comments: Vec<CommentResponse>,
    pub pagination: PaginationInfo,
}

/// Notification response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
    pub post_id: Option<String>,
    pub actor: AuthorSummary,
}

/// Paginated notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub pagination: PaginationInfo,
}

/// Registration/login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Follow/unfollow response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipResponse {
    pub following: bool,
}

/// Unread notification count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

/// Live notification event payload (SSE)
///
/// Lighter than [`NotificationResponse`]: carries IDs only so the
/// stream never touches the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEventResponse {
    pub id: String,
    pub kind: String,
    pub actor_id: String,
    pub post_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

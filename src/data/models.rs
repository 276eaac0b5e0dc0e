//! Data models
//!
//! Rust structs representing database entities.
//! All models use ULID for IDs and chrono for timestamps.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

lazy_static! {
    // Monotonic generator: plain `Ulid::new()` randomizes the suffix
    // within a millisecond, which would let two ids generated in the
    // same ms sort against creation order and break cursor windows.
    static ref ULID_GENERATOR: Mutex<ulid::Generator> = Mutex::new(ulid::Generator::new());
}

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// ULIDs sort lexicographically in creation order, which is what makes
/// `id < cursor` equivalent to "older than the cursor row".
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID, strictly greater than any previously
    /// generated in this process
    pub fn new() -> Self {
        let ulid = ULID_GENERATOR
            .lock()
            .ok()
            .and_then(|mut generator| generator.generate().ok())
            .unwrap_or_else(ulid::Ulid::new);
        Self(ulid.to_string())
    }

    /// Create from existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    /// Unique handle, stored lowercased
    pub username: String,
    /// Unique email, stored lowercased
    pub email: String,
    /// Argon2id hash, never exposed through the API layer
    pub password_hash: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Post
// =============================================================================

/// A post
///
/// `id` and `author_id` are immutable after creation;
/// `content` and `media_url` may be edited by the author.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    /// Plain text content
    pub content: String,
    /// Optional media URL (upload handling is out of scope; clients send URLs)
    pub media_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Follow edge
// =============================================================================

/// A follow edge, unique per (follower, followee) pair
///
/// Defines the visibility set for a viewer's feed.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follow {
    pub id: String,
    pub follower_id: String,
    pub followee_id: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Like
// =============================================================================

/// A like, unique per (user, post) pair
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Like {
    pub user_id: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Comment
// =============================================================================

/// A comment on a post
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Notifications
// =============================================================================

/// Notification for user interactions
///
/// Persisted to database (not volatile).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: String,
    /// Recipient user ID
    pub user_id: String,
    /// User who triggered the notification
    pub actor_id: String,
    /// Kind: follow, like, comment
    pub kind: String,
    /// Referenced post, if any
    pub post_id: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Follow,
    Like,
    Comment,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Follow => "follow",
            Self::Like => "like",
            Self::Comment => "comment",
        }
    }
}

// =============================================================================
// Derived rows
// =============================================================================

/// Aggregate engagement for one post, relative to a viewer
///
/// Not a stored entity; computed by counting child rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct EngagementRow {
    pub post_id: String,
    pub like_count: i64,
    pub comment_count: i64,
    pub viewer_has_liked: bool,
}

/// Follower/following/post counts for a user profile
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct UserCounts {
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: i64,
}

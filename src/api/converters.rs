//! Model -> DTO conversion helpers

use crate::data::{Comment, FeedItem, Notification, User, UserCounts};

use super::dto::*;

/// Build the compact author representation for embedding
pub fn user_to_summary(user: &User) -> AuthorSummary {
    AuthorSummary {
        id: user.id.clone(),
        username: user.username.clone(),
        display_name: user.display_name.clone(),
        avatar_url: user.avatar_url.clone(),
    }
}

/// Build a full profile response
pub fn user_to_response(user: &User, counts: &UserCounts) -> UserResponse {
    UserResponse {
        id: user.id.clone(),
        username: user.username.clone(),
        display_name: user.display_name.clone(),
        bio: user.bio.clone(),
        avatar_url: user.avatar_url.clone(),
        created_at: user.created_at,
        followers_count: counts.followers_count,
        following_count: counts.following_count,
        posts_count: counts.posts_count,
    }
}

/// Build a decorated post response from a feed item
pub fn feed_item_to_response(item: &FeedItem) -> PostResponse {
    PostResponse {
        id: item.post.id.clone(),
        content: item.post.content.clone(),
        media_url: item.post.media_url.clone(),
        created_at: item.post.created_at,
        author: user_to_summary(&item.author),
        like_count: item.like_count,
        comment_count: item.comment_count,
        viewer_has_liked: item.viewer_has_liked,
    }
}

/// Build a comment response with its resolved author
pub fn comment_to_response(comment: &Comment, author: &User) -> CommentResponse {
    CommentResponse {
        id: comment.id.clone(),
        post_id: comment.post_id.clone(),
        content: comment.content.clone(),
        created_at: comment.created_at,
        author: user_to_summary(author),
    }
}

/// Build a notification response with its resolved actor
pub fn notification_to_response(
    notification: &Notification,
    actor: &User,
) -> NotificationResponse {
    NotificationResponse {
        id: notification.id.clone(),
        kind: notification.kind.clone(),
        created_at: notification.created_at,
        read: notification.read,
        post_id: notification.post_id.clone(),
        actor: user_to_summary(actor),
    }
}

/// Build the SSE payload for a live notification
pub fn notification_to_event_response(notification: &Notification) -> NotificationEventResponse {
    NotificationEventResponse {
        id: notification.id.clone(),
        kind: notification.kind.clone(),
        actor_id: notification.actor_id.clone(),
        post_id: notification.post_id.clone(),
        created_at: notification.created_at,
    }
}

//! Post service
//!
//! Handles post operations including create, update, delete,
//! like/unlike, and comments. Every write that can change a cached
//! feed first page invalidates the feed cache coarsely.

use std::sync::Arc;

use chrono::Utc;

use crate::data::{
    Comment, Database, EntityId, FeedCache, FeedItem, NotificationKind, Post,
};
use crate::error::AppError;
use crate::service::{Notifier, decorate_posts};

const MAX_POST_CHARS: usize = 5000;
const MAX_COMMENT_CHARS: usize = 1000;

fn normalize_post_content(raw: &str) -> Result<String, AppError> {
    let content = raw.trim().to_string();
    if content.is_empty() {
        return Err(AppError::Validation("post content is required".to_string()));
    }
    if content.chars().count() > MAX_POST_CHARS {
        return Err(AppError::Validation(format!(
            "post content must be at most {} characters",
            MAX_POST_CHARS
        )));
    }
    Ok(content)
}

fn validate_media_url(raw: &str) -> Result<(), AppError> {
    url::Url::parse(raw)
        .map_err(|_| AppError::Validation("media_url must be a valid URL".to_string()))?;
    Ok(())
}

/// Post service
pub struct PostService {
    db: Arc<Database>,
    feed_cache: Arc<FeedCache>,
    notifier: Arc<Notifier>,
}

impl PostService {
    /// Create new post service
    pub fn new(db: Arc<Database>, feed_cache: Arc<FeedCache>, notifier: Arc<Notifier>) -> Self {
        Self {
            db,
            feed_cache,
            notifier,
        }
    }

    // =========================================================================
    // CRUD Operations
    // =========================================================================

    /// Create a new post
    ///
    /// # Side Effects
    /// - Inserts into database
    /// - Invalidates all cached feed first pages
    pub async fn create(
        &self,
        author_id: &str,
        content: &str,
        media_url: Option<&str>,
    ) -> Result<FeedItem, AppError> {
        let content = normalize_post_content(content)?;
        if let Some(media_url) = media_url {
            validate_media_url(media_url)?;
        }

        let now = Utc::now();
        let post = Post {
            id: EntityId::new().0,
            author_id: author_id.to_string(),
            content,
            media_url: media_url.map(ToOwned::to_owned),
            created_at: now,
            updated_at: now,
        };

        self.db.insert_post(&post).await?;
        self.feed_cache.invalidate_all().await;

        use crate::metrics::POSTS_TOTAL;
        POSTS_TOTAL.set(self.db.count_posts().await?);

        self.decorated(&post.id, Some(author_id)).await
    }

    /// Get a post decorated for a viewer
    pub async fn decorated(
        &self,
        post_id: &str,
        viewer_id: Option<&str>,
    ) -> Result<FeedItem, AppError> {
        let post = self
            .db
            .get_post(post_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut items = decorate_posts(&self.db, vec![post], viewer_id).await?;
        items.pop().ok_or(AppError::NotFound)
    }

    /// Update a post's content
    ///
    /// Only allowed for the author.
    pub async fn update(
        &self,
        user_id: &str,
        post_id: &str,
        content: &str,
    ) -> Result<FeedItem, AppError> {
        let post = self
            .db
            .get_post(post_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if post.author_id != user_id {
            return Err(AppError::Forbidden);
        }

        let content = normalize_post_content(content)?;
        self.db
            .update_post_content(post_id, &content, Utc::now())
            .await?;
        self.feed_cache.invalidate_all().await;

        self.decorated(post_id, Some(user_id)).await
    }

    /// Delete a post
    ///
    /// Only allowed for the author. Likes, comments, and notifications
    /// referencing the post go with it.
    pub async fn delete(&self, user_id: &str, post_id: &str) -> Result<(), AppError> {
        let post = self
            .db
            .get_post(post_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if post.author_id != user_id {
            return Err(AppError::Forbidden);
        }

        self.db.delete_post(post_id).await?;
        self.feed_cache.invalidate_all().await;

        use crate::metrics::POSTS_TOTAL;
        POSTS_TOTAL.set(self.db.count_posts().await?);

        Ok(())
    }

    /// A single author's posts, newest first, decorated for the viewer
    pub async fn posts_by_author(
        &self,
        author_id: &str,
        viewer_id: Option<&str>,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Vec<FeedItem>, AppError> {
        self.db
            .get_user(author_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let posts = self
            .db
            .get_posts_by_author(author_id, cursor, limit)
            .await?;
        decorate_posts(&self.db, posts, viewer_id).await
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Like a post (idempotent)
    ///
    /// # Side Effects
    /// - Notifies the post author on a first-time like
    /// - Invalidates all cached feed first pages
    pub async fn like(&self, user_id: &str, post_id: &str) -> Result<FeedItem, AppError> {
        let post = self
            .db
            .get_post(post_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let created = self.db.insert_like(user_id, post_id).await?;
        if created {
            self.notifier
                .record(&post.author_id, user_id, NotificationKind::Like, Some(post_id))
                .await?;
        }
        self.feed_cache.invalidate_all().await;

        self.decorated(post_id, Some(user_id)).await
    }

    /// Remove a like (idempotent)
    pub async fn unlike(&self, user_id: &str, post_id: &str) -> Result<FeedItem, AppError> {
        self.db
            .get_post(post_id)
            .await?
            .ok_or(AppError::NotFound)?;

        self.db.delete_like(user_id, post_id).await?;
        self.feed_cache.invalidate_all().await;

        self.decorated(post_id, Some(user_id)).await
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Comment on a post
    ///
    /// # Side Effects
    /// - Notifies the post author
    /// - Invalidates all cached feed first pages
    pub async fn comment(
        &self,
        author_id: &str,
        post_id: &str,
        content: &str,
    ) -> Result<Comment, AppError> {
        let post = self
            .db
            .get_post(post_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::Validation(
                "comment content is required".to_string(),
            ));
        }
        if content.chars().count() > MAX_COMMENT_CHARS {
            return Err(AppError::Validation(format!(
                "comment content must be at most {} characters",
                MAX_COMMENT_CHARS
            )));
        }

        let comment = Comment {
            id: EntityId::new().0,
            post_id: post_id.to_string(),
            author_id: author_id.to_string(),
            content,
            created_at: Utc::now(),
        };

        self.db.insert_comment(&comment).await?;
        self.notifier
            .record(
                &post.author_id,
                author_id,
                NotificationKind::Comment,
                Some(post_id),
            )
            .await?;
        self.feed_cache.invalidate_all().await;

        Ok(comment)
    }

    /// Delete a comment
    ///
    /// Allowed for the comment author and for the author of the post
    /// it sits under.
    pub async fn delete_comment(&self, user_id: &str, comment_id: &str) -> Result<(), AppError> {
        let comment = self
            .db
            .get_comment(comment_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if comment.author_id != user_id {
            let post = self
                .db
                .get_post(&comment.post_id)
                .await?
                .ok_or(AppError::NotFound)?;
            if post.author_id != user_id {
                return Err(AppError::Forbidden);
            }
        }

        self.db.delete_comment(comment_id).await?;
        self.feed_cache.invalidate_all().await;

        Ok(())
    }

    /// A post's comments in thread order (oldest first)
    pub async fn comments_page(
        &self,
        post_id: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Comment>, AppError> {
        self.db
            .get_post(post_id)
            .await?
            .ok_or(AppError::NotFound)?;

        self.db.get_comments_page(post_id, cursor, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::realtime::EventBus;
    use tempfile::TempDir;

    async fn create_service() -> (PostService, Arc<Database>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("service-post.db");
        let db = Arc::new(Database::connect(&db_path).await.unwrap());
        let cache = Arc::new(FeedCache::new(&CacheConfig {
            enabled: true,
            feed_ttl_seconds: 300,
            feed_max_entries: 100,
        }));
        let notifier = Arc::new(Notifier::new(db.clone(), Arc::new(EventBus::new())));
        (PostService::new(db.clone(), cache, notifier), db, temp_dir)
    }

    async fn seed_user(db: &Database, username: &str) -> String {
        let now = Utc::now();
        let user = crate::data::User {
            id: EntityId::new().0,
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: "hash".to_string(),
            display_name: None,
            bio: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };
        db.insert_user(&user).await.unwrap();
        user.id
    }

    #[tokio::test]
    async fn create_trims_and_decorates() {
        let (service, db, _temp_dir) = create_service().await;
        let alice = seed_user(&db, "alice").await;

        let item = service.create(&alice, "  hello world  ", None).await.unwrap();
        assert_eq!(item.post.content, "hello world");
        assert_eq!(item.author.username, "alice");
        assert_eq!(item.like_count, 0);
        assert!(!item.viewer_has_liked);
    }

    #[tokio::test]
    async fn create_rejects_invalid_input() {
        let (service, db, _temp_dir) = create_service().await;
        let alice = seed_user(&db, "alice").await;

        let empty = service.create(&alice, "   ", None).await.unwrap_err();
        assert!(matches!(empty, AppError::Validation(_)));

        let oversized = "x".repeat(MAX_POST_CHARS + 1);
        let too_long = service.create(&alice, &oversized, None).await.unwrap_err();
        assert!(matches!(too_long, AppError::Validation(_)));

        let bad_url = service
            .create(&alice, "hello", Some("not a url"))
            .await
            .unwrap_err();
        assert!(matches!(bad_url, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn only_the_author_can_update_or_delete() {
        let (service, db, _temp_dir) = create_service().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;

        let item = service.create(&alice, "hello", None).await.unwrap();

        let update_error = service
            .update(&bob, &item.post.id, "hijacked")
            .await
            .unwrap_err();
        assert!(matches!(update_error, AppError::Forbidden));

        let delete_error = service.delete(&bob, &item.post.id).await.unwrap_err();
        assert!(matches!(delete_error, AppError::Forbidden));

        let updated = service
            .update(&alice, &item.post.id, "edited")
            .await
            .unwrap();
        assert_eq!(updated.post.content, "edited");

        service.delete(&alice, &item.post.id).await.unwrap();
        let gone = service.decorated(&item.post.id, None).await.unwrap_err();
        assert!(matches!(gone, AppError::NotFound));
    }

    #[tokio::test]
    async fn like_toggles_counts_and_notifies_once() {
        let (service, db, _temp_dir) = create_service().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;

        let item = service.create(&alice, "hello", None).await.unwrap();

        let liked = service.like(&bob, &item.post.id).await.unwrap();
        assert_eq!(liked.like_count, 1);
        assert!(liked.viewer_has_liked);

        // Second like is a no-op and does not re-notify
        let again = service.like(&bob, &item.post.id).await.unwrap();
        assert_eq!(again.like_count, 1);
        assert_eq!(db.count_unread_notifications(&alice).await.unwrap(), 1);

        let unliked = service.unlike(&bob, &item.post.id).await.unwrap();
        assert_eq!(unliked.like_count, 0);
        assert!(!unliked.viewer_has_liked);
    }

    #[tokio::test]
    async fn comment_rules_and_thread_order() {
        let (service, db, _temp_dir) = create_service().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;

        let item = service.create(&alice, "hello", None).await.unwrap();

        let first = service
            .comment(&bob, &item.post.id, "first!")
            .await
            .unwrap();
        let second = service
            .comment(&alice, &item.post.id, "thanks")
            .await
            .unwrap();

        // Bob's comment notified alice; alice commenting on her own
        // post notified nobody.
        assert_eq!(db.count_unread_notifications(&alice).await.unwrap(), 1);
        assert_eq!(db.count_unread_notifications(&bob).await.unwrap(), 0);

        let page = service.comments_page(&item.post.id, None, 10).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, first.id);
        assert_eq!(page[1].id, second.id);

        // A stranger cannot delete, the post author can
        let stranger = seed_user(&db, "carol").await;
        let error = service.delete_comment(&stranger, &first.id).await.unwrap_err();
        assert!(matches!(error, AppError::Forbidden));
        service.delete_comment(&alice, &first.id).await.unwrap();
    }
}

//! SQLite database operations
//!
//! All database access goes through this module.
//! Uses SQLx with runtime-bound queries.

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::{Pool, QueryBuilder, Sqlite};

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

/// Map a unique-index violation to a domain conflict, pass everything
/// else through as a database error.
fn map_unique_violation(error: sqlx::Error, message: &str) -> AppError {
    match &error {
        sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(error),
    }
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let db_path = path.to_str().ok_or_else(|| {
            AppError::Config(format!(
                "database path must be valid UTF-8: {}",
                path.display()
            ))
        })?;

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path))
            .map_err(AppError::Database)?
            .create_if_missing(true)
            // Cascading deletes (post -> likes/comments/notifications) rely on this.
            .foreign_keys(true);

        let pool = SqlitePool::connect_with(options).await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
            tracing::error!("Migration failed: {}", e);
            AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
        })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a new user
    ///
    /// # Errors
    /// Returns `Conflict` if the username or email is already taken.
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, password_hash, display_name, bio,
                avatar_url, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.display_name)
        .bind(&user.bio)
        .bind(&user.avatar_url)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "username or email is already taken"))?;

        Ok(())
    }

    /// Get user by ID
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get user by username (case-insensitive)
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get user by username or email (case-insensitive)
    ///
    /// Used by login, where the identifier field accepts either.
    pub async fn get_user_by_login(&self, identifier: &str) -> Result<Option<User>, AppError> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ? OR email = ?")
                .bind(identifier)
                .bind(identifier)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }

    /// Get multiple users by IDs (batch operation to avoid N+1)
    pub async fn get_users_by_ids(&self, ids: &[String]) -> Result<Vec<User>, AppError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        // SQLite limits the number of bound parameters, so query in chunks.
        let mut all_users = Vec::new();

        for chunk in ids.chunks(100) {
            let placeholders = chunk.iter().map(|_| "?").collect::<Vec<_>>().join(",");

            let query = format!("SELECT * FROM users WHERE id IN ({})", placeholders);

            let mut query_builder = sqlx::query_as::<_, User>(&query);
            for id in chunk {
                query_builder = query_builder.bind(id);
            }

            let users = query_builder.fetch_all(&self.pool).await?;
            all_users.extend(users);
        }

        Ok(all_users)
    }

    /// Update user profile fields by user ID.
    ///
    /// Omitted (`None`) fields are left unchanged.
    ///
    /// # Returns
    /// `true` if updated, `false` if no matching user row exists.
    pub async fn update_user_profile(
        &self,
        user_id: &str,
        display_name: Option<&str>,
        bio: Option<&str>,
        avatar_url: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET display_name = COALESCE(?, display_name),
                bio = COALESCE(?, bio),
                avatar_url = COALESCE(?, avatar_url),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(display_name)
        .bind(bio)
        .bind(avatar_url)
        .bind(updated_at)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Get follower/following/post counts for a user profile.
    pub async fn get_user_counts(&self, user_id: &str) -> Result<UserCounts, AppError> {
        let counts = sqlx::query_as::<_, UserCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM follows WHERE followee_id = ?) AS followers_count,
                (SELECT COUNT(*) FROM follows WHERE follower_id = ?) AS following_count,
                (SELECT COUNT(*) FROM posts WHERE author_id = ?) AS posts_count
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Count registered users (metrics gauge).
    pub async fn count_users(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Follow edges
    // =========================================================================

    /// Insert a follow edge.
    ///
    /// # Returns
    /// `true` if a new edge was created, `false` if it already existed.
    pub async fn insert_follow(&self, follow: &Follow) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO follows (id, follower_id, followee_id, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&follow.id)
        .bind(&follow.follower_id)
        .bind(&follow.followee_id)
        .bind(follow.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete a follow edge.
    ///
    /// # Returns
    /// `true` if an edge was removed, `false` if none existed.
    pub async fn delete_follow(&self, follower_id: &str, followee_id: &str) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followee_id = ?")
                .bind(follower_id)
                .bind(followee_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Check whether follower follows followee.
    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ? AND followee_id = ?)",
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists == 1)
    }

    /// Get all followee IDs for a viewer (the feed visibility set,
    /// minus the viewer themselves).
    pub async fn get_followee_ids(&self, follower_id: &str) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT followee_id FROM follows WHERE follower_id = ?",
        )
        .bind(follower_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Get a page of followers for a user (newest edge first).
    ///
    /// # Arguments
    /// * `cursor` - Return edges older than the edge with this ID
    pub async fn get_followers_page(
        &self,
        user_id: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Vec<(String, User)>, AppError> {
        self.get_follow_edge_page(user_id, cursor, limit, FollowDirection::Followers)
            .await
    }

    /// Get a page of users someone follows (newest edge first).
    pub async fn get_following_page(
        &self,
        user_id: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Vec<(String, User)>, AppError> {
        self.get_follow_edge_page(user_id, cursor, limit, FollowDirection::Following)
            .await
    }

    async fn get_follow_edge_page(
        &self,
        user_id: &str,
        cursor: Option<&str>,
        limit: usize,
        direction: FollowDirection,
    ) -> Result<Vec<(String, User)>, AppError> {
        let (anchor_column, join_column) = match direction {
            FollowDirection::Followers => ("followee_id", "follower_id"),
            FollowDirection::Following => ("follower_id", "followee_id"),
        };

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT f.id AS edge_id, u.* FROM follows f \
             JOIN users u ON u.id = f.{join_column} \
             WHERE f.{anchor_column} = "
        ));
        builder.push_bind(user_id);
        if let Some(cursor) = cursor {
            builder.push(" AND f.id < ");
            builder.push_bind(cursor);
        }
        builder.push(" ORDER BY f.id DESC LIMIT ");
        builder.push_bind(limit as i64);

        let rows: Vec<FollowEdgeRow> = builder
            .build_query_as::<FollowEdgeRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.edge_id, row.user))
            .collect())
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Insert a new post
    pub async fn insert_post(&self, post: &Post) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, author_id, content, media_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.author_id)
        .bind(&post.content)
        .bind(&post.media_url)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get post by ID
    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    /// Update post content by ID.
    ///
    /// # Returns
    /// `true` if updated, `false` if no matching post row exists.
    pub async fn update_post_content(
        &self,
        post_id: &str,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE posts SET content = ?, updated_at = ? WHERE id = ?")
            .bind(content)
            .bind(updated_at)
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete post by ID.
    ///
    /// Likes, comments, and notifications referencing the post are
    /// removed by cascade.
    ///
    /// # Returns
    /// `true` if a post was removed.
    pub async fn delete_post(&self, post_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Get one feed window: posts authored by any of `author_ids`,
    /// older than `cursor` if given, newest first.
    ///
    /// Ordering is by creation time descending with ID as tiebreak;
    /// IDs are ULIDs, so the two agree and the order is total.
    ///
    /// # Arguments
    /// * `limit` - Maximum rows to fetch (callers pass page size + 1 to
    ///   detect whether another page exists)
    pub async fn get_feed_page(
        &self,
        author_ids: &[String],
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Post>, AppError> {
        if author_ids.is_empty() {
            return Ok(vec![]);
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM posts WHERE author_id IN (");
        let mut separated = builder.separated(", ");
        for author_id in author_ids {
            separated.push_bind(author_id);
        }
        builder.push(")");

        if let Some(cursor) = cursor {
            builder.push(" AND id < ");
            builder.push_bind(cursor);
        }

        builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        builder.push_bind(limit as i64);

        let posts = builder
            .build_query_as::<Post>()
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    /// Get a single author's posts (paginated, newest first)
    ///
    /// # Arguments
    /// * `cursor` - Return posts older than this ID
    pub async fn get_posts_by_author(
        &self,
        author_id: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Post>, AppError> {
        let posts = if let Some(cursor) = cursor {
            sqlx::query_as::<_, Post>(
                r#"
                SELECT * FROM posts
                WHERE author_id = ? AND id < ?
                ORDER BY created_at DESC, id DESC
                LIMIT ?
                "#,
            )
            .bind(author_id)
            .bind(cursor)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Post>(
                r#"
                SELECT * FROM posts
                WHERE author_id = ?
                ORDER BY created_at DESC, id DESC
                LIMIT ?
                "#,
            )
            .bind(author_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(posts)
    }

    /// Count posts (metrics gauge).
    pub async fn count_posts(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Insert a like.
    ///
    /// # Returns
    /// `true` if a new like was created, `false` if it already existed.
    pub async fn insert_like(&self, user_id: &str, post_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO likes (user_id, post_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(post_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete a like.
    ///
    /// # Returns
    /// `true` if a like was removed.
    pub async fn delete_like(&self, user_id: &str, post_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM likes WHERE user_id = ? AND post_id = ?")
            .bind(user_id)
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Batch engagement lookup for a page of posts.
    ///
    /// Returns like count, comment count, and whether `viewer_id` has
    /// liked, per post ID. Posts missing from the result decorate to
    /// zero counts and `false` on the caller's side.
    pub async fn engagement_for_posts(
        &self,
        post_ids: &[String],
        viewer_id: Option<&str>,
    ) -> Result<Vec<EngagementRow>, AppError> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        // A viewer-less lookup binds an impossible user ID so the EXISTS
        // subquery is uniformly false.
        let viewer_id = viewer_id.unwrap_or("");

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT p.id AS post_id, \
             (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count, \
             (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count, \
             EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = ",
        );
        builder.push_bind(viewer_id);
        builder.push(") AS viewer_has_liked FROM posts p WHERE p.id IN (");
        let mut separated = builder.separated(", ");
        for post_id in post_ids {
            separated.push_bind(post_id);
        }
        builder.push(")");

        let rows = builder
            .build_query_as::<EngagementRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Insert a new comment
    pub async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, post_id, author_id, content, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.post_id)
        .bind(&comment.author_id)
        .bind(&comment.content)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get comment by ID
    pub async fn get_comment(&self, id: &str) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(comment)
    }

    /// Delete comment by ID.
    ///
    /// # Returns
    /// `true` if a comment was removed.
    pub async fn delete_comment(&self, comment_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Get a page of comments for a post, oldest first (thread order).
    ///
    /// # Arguments
    /// * `cursor` - Return comments newer than this ID
    pub async fn get_comments_page(
        &self,
        post_id: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Comment>, AppError> {
        let comments = if let Some(cursor) = cursor {
            sqlx::query_as::<_, Comment>(
                r#"
                SELECT * FROM comments
                WHERE post_id = ? AND id > ?
                ORDER BY id ASC
                LIMIT ?
                "#,
            )
            .bind(post_id)
            .bind(cursor)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Comment>(
                r#"
                SELECT * FROM comments
                WHERE post_id = ?
                ORDER BY id ASC
                LIMIT ?
                "#,
            )
            .bind(post_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(comments)
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Insert a notification
    pub async fn insert_notification(&self, notification: &Notification) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, actor_id, kind, post_id, read, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&notification.id)
        .bind(&notification.user_id)
        .bind(&notification.actor_id)
        .bind(&notification.kind)
        .bind(&notification.post_id)
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a page of notifications for a recipient, newest first.
    ///
    /// # Arguments
    /// * `cursor` - Return notifications older than this ID
    pub async fn get_notifications_page(
        &self,
        user_id: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Notification>, AppError> {
        let notifications = if let Some(cursor) = cursor {
            sqlx::query_as::<_, Notification>(
                r#"
                SELECT * FROM notifications
                WHERE user_id = ? AND id < ?
                ORDER BY id DESC
                LIMIT ?
                "#,
            )
            .bind(user_id)
            .bind(cursor)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Notification>(
                r#"
                SELECT * FROM notifications
                WHERE user_id = ?
                ORDER BY id DESC
                LIMIT ?
                "#,
            )
            .bind(user_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(notifications)
    }

    /// Mark one notification read (recipient-scoped).
    ///
    /// # Returns
    /// `true` if the notification exists and belongs to the recipient.
    pub async fn mark_notification_read(
        &self,
        user_id: &str,
        notification_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE notifications SET read = 1 WHERE id = ? AND user_id = ?")
            .bind(notification_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Mark all of a recipient's notifications read.
    pub async fn mark_all_notifications_read(&self, user_id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE notifications SET read = 1 WHERE user_id = ? AND read = 0")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Count unread notifications for a recipient.
    pub async fn count_unread_notifications(&self, user_id: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND read = 0",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

enum FollowDirection {
    Followers,
    Following,
}

/// A follow edge joined with the user on its far side.
#[derive(sqlx::FromRow)]
struct FollowEdgeRow {
    edge_id: String,
    #[sqlx(flatten)]
    user: User,
}

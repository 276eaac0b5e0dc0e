//! Feed assembly
//!
//! Produces pages of a viewer's reverse-chronological home feed:
//! resolve the follow set, window by cursor, decorate with engagement,
//! and cache the hot first page.

use std::collections::HashMap;
use std::sync::Arc;

use crate::data::{Database, FeedCache, FeedItem, FeedPage, Post, User};
use crate::error::AppError;

/// Feed service
pub struct FeedService {
    db: Arc<Database>,
    cache: Arc<FeedCache>,
    default_page_size: usize,
    max_page_size: usize,
}

impl FeedService {
    /// Create new feed service
    pub fn new(
        db: Arc<Database>,
        cache: Arc<FeedCache>,
        default_page_size: usize,
        max_page_size: usize,
    ) -> Self {
        Self {
            db,
            cache,
            default_page_size,
            max_page_size,
        }
    }

    /// Clamp a client-requested page size into `[1, max_page_size]`,
    /// falling back to the default when absent. Out-of-range values
    /// clamp rather than error, so stale clients keep paginating.
    pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size)
    }

    /// Get one page of the viewer's home feed
    ///
    /// Posts authored by followed users and by the viewer themselves,
    /// newest first, strictly older than `cursor` when given.
    ///
    /// Only the cursor-less first page is served from (and written to)
    /// the cache; cursor requests always hit the database.
    ///
    /// A cursor that references a post that no longer exists (or never
    /// did) yields an empty page, not an error.
    ///
    /// # Arguments
    /// * `viewer_id` - Authenticated viewer
    /// * `cursor` - ID of the last item of the previous page
    /// * `limit` - Page size, already clamped via [`Self::clamp_limit`]
    pub async fn home_feed(
        &self,
        viewer_id: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<FeedPage, AppError> {
        use crate::metrics::FEED_PAGES_TOTAL;

        // 1. First page: consult the cache before touching the store.
        if cursor.is_none() {
            if let Some(page) = self.cache.get(viewer_id).await {
                FEED_PAGES_TOTAL.with_label_values(&["cache"]).inc();
                return Ok((*page).clone());
            }
        }

        // 2. A cursor must name an existing post; a stale cursor
        //    (deleted post) means "nothing older" rather than an error.
        if let Some(cursor) = cursor {
            if self.db.get_post(cursor).await?.is_none() {
                FEED_PAGES_TOTAL.with_label_values(&["database"]).inc();
                return Ok(FeedPage {
                    items: vec![],
                    has_more: false,
                    next_cursor: None,
                });
            }
        }

        // 3. Resolve the visibility set: followees plus the viewer.
        let mut author_ids = self.db.get_followee_ids(viewer_id).await?;
        author_ids.push(viewer_id.to_string());

        // 4. Fetch one row beyond the page size to detect another page.
        let mut posts = self
            .db
            .get_feed_page(&author_ids, cursor, limit + 1)
            .await?;

        let has_more = posts.len() > limit;
        if has_more {
            posts.truncate(limit);
        }
        let next_cursor = if has_more {
            posts.last().map(|post| post.id.clone())
        } else {
            None
        };

        // 5. Decorate with authors and engagement.
        let items = decorate_posts(&self.db, posts, Some(viewer_id)).await?;

        let page = FeedPage {
            items,
            has_more,
            next_cursor,
        };

        // 6. Populate the cache for the next cursor-less request.
        if cursor.is_none() {
            self.cache.insert(viewer_id, page.clone()).await;
        }

        FEED_PAGES_TOTAL.with_label_values(&["database"]).inc();
        Ok(page)
    }
}

/// Attach author and engagement data to a page of posts.
///
/// Never changes the set or order of posts. A post missing from the
/// engagement result decorates to zero counts and `false` liked-state;
/// a missing author row (unreachable while posts cascade-delete with
/// their author) decorates to an empty profile rather than failing the
/// page.
pub(crate) async fn decorate_posts(
    db: &Database,
    posts: Vec<Post>,
    viewer_id: Option<&str>,
) -> Result<Vec<FeedItem>, AppError> {
    if posts.is_empty() {
        return Ok(vec![]);
    }

    let post_ids: Vec<String> = posts.iter().map(|post| post.id.clone()).collect();

    let mut author_ids: Vec<String> = posts.iter().map(|post| post.author_id.clone()).collect();
    author_ids.sort();
    author_ids.dedup();

    let authors: HashMap<String, User> = db
        .get_users_by_ids(&author_ids)
        .await?
        .into_iter()
        .map(|user| (user.id.clone(), user))
        .collect();

    let engagement: HashMap<String, (i64, i64, bool)> = db
        .engagement_for_posts(&post_ids, viewer_id)
        .await?
        .into_iter()
        .map(|row| {
            (
                row.post_id,
                (row.like_count, row.comment_count, row.viewer_has_liked),
            )
        })
        .collect();

    let items = posts
        .into_iter()
        .map(|post| {
            let (like_count, comment_count, viewer_has_liked) = engagement
                .get(&post.id)
                .copied()
                .unwrap_or((0, 0, false));
            let author = authors
                .get(&post.author_id)
                .cloned()
                .unwrap_or_else(|| placeholder_author(&post.author_id));

            FeedItem {
                post,
                author,
                like_count,
                comment_count,
                viewer_has_liked,
            }
        })
        .collect();

    Ok(items)
}

fn placeholder_author(author_id: &str) -> User {
    let now = chrono::Utc::now();
    User {
        id: author_id.to_string(),
        username: String::new(),
        email: String::new(),
        password_hash: String::new(),
        display_name: None,
        bio: None,
        avatar_url: None,
        created_at: now,
        updated_at: now,
    }
}

//! Feed first-page cache
//!
//! Volatile, in-process, cleared on restart.
//! Uses Moka for high-performance concurrent caching.
//!
//! Only the cursor-less first page of a viewer's feed is ever cached;
//! cursor requests always go to the database. Two concurrent misses for
//! the same viewer may both assemble and both insert — last writer wins,
//! the pages are equivalent.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use super::models::{Post, User};
use crate::config::CacheConfig;

/// One assembled feed page, as returned to (and cached for) a viewer.
#[derive(Debug, Clone)]
pub struct FeedPage {
    pub items: Vec<FeedItem>,
    pub has_more: bool,
    /// ID of the last item of this page when another page exists
    pub next_cursor: Option<String>,
}

/// One post in a feed page, decorated with its author and
/// viewer-relative engagement.
#[derive(Debug, Clone)]
pub struct FeedItem {
    pub post: Post,
    pub author: User,
    pub like_count: i64,
    pub comment_count: i64,
    pub viewer_has_liked: bool,
}

/// Feed first-page cache (volatile, TTL-bound)
///
/// Keyed by viewer ID. When constructed disabled, every lookup misses
/// and every insert is dropped, so the read path runs entirely against
/// the database and responses are unchanged.
pub struct FeedCache {
    /// Viewer ID -> cached first page; `None` when the cache is disabled
    entries: Option<Cache<String, Arc<FeedPage>>>,
}

impl FeedCache {
    /// Create new feed cache from configuration
    pub fn new(config: &CacheConfig) -> Self {
        if !config.enabled {
            tracing::info!("Feed cache disabled; all reads go to the database");
            return Self { entries: None };
        }

        let entries = Cache::builder()
            .max_capacity(config.feed_max_entries as u64)
            .time_to_live(Duration::from_secs(config.feed_ttl_seconds))
            .build();

        Self {
            entries: Some(entries),
        }
    }

    /// Get a viewer's cached first page
    pub async fn get(&self, viewer_id: &str) -> Option<Arc<FeedPage>> {
        let entries = self.entries.as_ref()?;
        let result = entries.get(viewer_id).await;

        // Record cache hit/miss
        use crate::metrics::{CACHE_HITS_TOTAL, CACHE_MISSES_TOTAL};
        if result.is_some() {
            CACHE_HITS_TOTAL.with_label_values(&["feed"]).inc();
        } else {
            CACHE_MISSES_TOTAL.with_label_values(&["feed"]).inc();
        }

        result
    }

    /// Store a viewer's assembled first page
    pub async fn insert(&self, viewer_id: &str, page: FeedPage) {
        let Some(entries) = self.entries.as_ref() else {
            return;
        };

        entries.insert(viewer_id.to_string(), Arc::new(page)).await;

        // Update cache size metric
        use crate::metrics::CACHE_SIZE;
        CACHE_SIZE
            .with_label_values(&["feed"])
            .set(entries.entry_count() as i64);
    }

    /// Drop one viewer's cached first page
    ///
    /// Used when only that viewer's feed composition changed
    /// (follow/unfollow).
    pub async fn remove(&self, viewer_id: &str) {
        if let Some(entries) = self.entries.as_ref() {
            entries.invalidate(viewer_id).await;
        }
    }

    /// Drop every cached first page
    ///
    /// Coarse invalidation: any write that can change some viewer's
    /// first page (post create/update/delete, like/unlike, comment
    /// create/delete) clears all keys rather than resolving the
    /// affected follower set.
    pub async fn invalidate_all(&self) {
        if let Some(entries) = self.entries.as_ref() {
            entries.invalidate_all();
        }
    }
}

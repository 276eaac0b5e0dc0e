//! Data layer module
//!
//! Handles all data persistence and caching:
//! - SQLite database operations
//! - Feed first-page cache (volatile)

mod cache;
mod database;
mod models;

pub use cache::{FeedCache, FeedItem, FeedPage};
pub use database::Database;
pub use models::*;

#[cfg(test)]
mod database_test;

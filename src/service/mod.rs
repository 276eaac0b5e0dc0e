//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate database, cache, and notification operations.

mod account;
mod feed;
mod notify;
mod post;

pub use account::AccountService;
pub use feed::FeedService;
pub use notify::Notifier;
pub use post::PostService;

pub(crate) use feed::decorate_posts;

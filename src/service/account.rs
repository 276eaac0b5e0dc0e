//! Account service
//!
//! Handles registration, login, profiles, and the follow graph.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::{hash_password, verify_password};
use crate::data::{Database, EntityId, FeedCache, Follow, NotificationKind, User, UserCounts};
use crate::error::AppError;
use crate::service::Notifier;

const MIN_USERNAME_CHARS: usize = 3;
const MAX_USERNAME_CHARS: usize = 30;
const MAX_EMAIL_CHARS: usize = 254;
const MAX_DISPLAY_NAME_CHARS: usize = 100;
const MAX_BIO_CHARS: usize = 500;

fn normalize_username(raw: &str) -> Result<String, AppError> {
    let username = raw.trim().to_ascii_lowercase();
    let length = username.chars().count();
    if !(MIN_USERNAME_CHARS..=MAX_USERNAME_CHARS).contains(&length) {
        return Err(AppError::Validation(format!(
            "username must be between {} and {} characters",
            MIN_USERNAME_CHARS, MAX_USERNAME_CHARS
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(AppError::Validation(
            "username may only contain letters, digits, and underscores".to_string(),
        ));
    }
    Ok(username)
}

fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_ascii_lowercase();
    let has_local_and_domain = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if email.len() > MAX_EMAIL_CHARS || email.chars().any(char::is_whitespace) || !has_local_and_domain
    {
        return Err(AppError::Validation(
            "email address is not valid".to_string(),
        ));
    }
    Ok(email)
}

fn validate_avatar_url(raw: &str) -> Result<(), AppError> {
    url::Url::parse(raw)
        .map_err(|_| AppError::Validation("avatar_url must be a valid URL".to_string()))?;
    Ok(())
}

/// Account service
pub struct AccountService {
    db: Arc<Database>,
    feed_cache: Arc<FeedCache>,
    notifier: Arc<Notifier>,
}

impl AccountService {
    /// Create new account service
    pub fn new(db: Arc<Database>, feed_cache: Arc<FeedCache>, notifier: Arc<Notifier>) -> Self {
        Self {
            db,
            feed_cache,
            notifier,
        }
    }

    // =========================================================================
    // Registration & login
    // =========================================================================

    /// Register a new user
    ///
    /// Username and email are normalized to lowercase; uniqueness is
    /// enforced by the database (`Conflict` on a duplicate).
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AppError> {
        let username = normalize_username(username)?;
        let email = normalize_email(email)?;
        let password_hash = hash_password(password)?;

        let now = Utc::now();
        let user = User {
            id: EntityId::new().0,
            username,
            email,
            password_hash,
            display_name: None,
            bio: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };

        self.db.insert_user(&user).await?;

        use crate::metrics::USERS_TOTAL;
        USERS_TOTAL.set(self.db.count_users().await?);

        tracing::info!(username = %user.username, "User registered");

        Ok(user)
    }

    /// Authenticate by username or email
    ///
    /// Unknown identifier and wrong password are indistinguishable to
    /// the caller.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<User, AppError> {
        let identifier = identifier.trim().to_ascii_lowercase();
        let user = self
            .db
            .get_user_by_login(&identifier)
            .await?
            .ok_or(AppError::Unauthorized)?;

        verify_password(password, &user.password_hash)?;

        Ok(user)
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    /// Get a user with profile counts
    pub async fn get_profile(&self, user_id: &str) -> Result<(User, UserCounts), AppError> {
        let user = self.db.get_user(user_id).await?.ok_or(AppError::NotFound)?;
        let counts = self.db.get_user_counts(user_id).await?;
        Ok((user, counts))
    }

    /// Update profile fields; omitted fields are unchanged
    pub async fn update_profile(
        &self,
        user_id: &str,
        display_name: Option<&str>,
        bio: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<(User, UserCounts), AppError> {
        if let Some(display_name) = display_name {
            if display_name.chars().count() > MAX_DISPLAY_NAME_CHARS {
                return Err(AppError::Validation(format!(
                    "display_name must be at most {} characters",
                    MAX_DISPLAY_NAME_CHARS
                )));
            }
        }
        if let Some(bio) = bio {
            if bio.chars().count() > MAX_BIO_CHARS {
                return Err(AppError::Validation(format!(
                    "bio must be at most {} characters",
                    MAX_BIO_CHARS
                )));
            }
        }
        if let Some(avatar_url) = avatar_url {
            validate_avatar_url(avatar_url)?;
        }

        let updated = self
            .db
            .update_user_profile(user_id, display_name, bio, avatar_url, Utc::now())
            .await?;
        if !updated {
            return Err(AppError::NotFound);
        }

        self.get_profile(user_id).await
    }

    // =========================================================================
    // Follow graph
    // =========================================================================

    /// Follow a user
    ///
    /// Idempotent: following someone you already follow is a no-op.
    /// Notifies the target on a newly created edge and drops the
    /// follower's cached feed first page (their feed composition
    /// changed; nobody else's did).
    ///
    /// # Returns
    /// `true` if a new edge was created
    pub async fn follow(&self, follower_id: &str, target_id: &str) -> Result<bool, AppError> {
        if follower_id == target_id {
            return Err(AppError::Validation(
                "you cannot follow yourself".to_string(),
            ));
        }

        let target = self
            .db
            .get_user(target_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let follow = Follow {
            id: EntityId::new().0,
            follower_id: follower_id.to_string(),
            followee_id: target.id.clone(),
            created_at: Utc::now(),
        };
        let created = self.db.insert_follow(&follow).await?;

        if created {
            self.notifier
                .record(&target.id, follower_id, NotificationKind::Follow, None)
                .await?;
        }

        self.feed_cache.remove(follower_id).await;

        Ok(created)
    }

    /// Unfollow a user (idempotent)
    pub async fn unfollow(&self, follower_id: &str, target_id: &str) -> Result<bool, AppError> {
        // Unfollowing an unknown user still 404s; an existing user you
        // never followed is a no-op.
        self.db
            .get_user(target_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let removed = self.db.delete_follow(follower_id, target_id).await?;
        self.feed_cache.remove(follower_id).await;

        Ok(removed)
    }

    /// Relationship between a viewer and a target user
    pub async fn is_following(&self, follower_id: &str, target_id: &str) -> Result<bool, AppError> {
        self.db.is_following(follower_id, target_id).await
    }

    /// Page of followers for a user (newest edge first)
    ///
    /// Each entry pairs the edge ID (the page cursor) with the user.
    pub async fn followers_page(
        &self,
        user_id: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Vec<(String, User)>, AppError> {
        self.db
            .get_user(user_id)
            .await?
            .ok_or(AppError::NotFound)?;
        self.db.get_followers_page(user_id, cursor, limit).await
    }

    /// Page of users someone follows (newest edge first)
    pub async fn following_page(
        &self,
        user_id: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Vec<(String, User)>, AppError> {
        self.db
            .get_user(user_id)
            .await?
            .ok_or(AppError::NotFound)?;
        self.db.get_following_page(user_id, cursor, limit).await
    }
}

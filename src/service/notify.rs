//! Notification recording
//!
//! Persists notifications and publishes them on the realtime bus.

use std::sync::Arc;

use chrono::Utc;

use crate::data::{Database, EntityId, Notification, NotificationKind};
use crate::error::AppError;
use crate::realtime::{EventBus, NotificationEvent};

/// Notification recorder
pub struct Notifier {
    db: Arc<Database>,
    events: Arc<EventBus>,
}

impl Notifier {
    /// Create new notifier
    pub fn new(db: Arc<Database>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    /// Record a notification and broadcast it to live subscribers.
    ///
    /// Acting on your own content does not notify (no self-notifications).
    ///
    /// # Arguments
    /// * `recipient_id` - User being notified
    /// * `actor_id` - User whose action triggered it
    /// * `post_id` - Referenced post for like/comment kinds
    pub async fn record(
        &self,
        recipient_id: &str,
        actor_id: &str,
        kind: NotificationKind,
        post_id: Option<&str>,
    ) -> Result<(), AppError> {
        if recipient_id == actor_id {
            return Ok(());
        }

        let notification = Notification {
            id: EntityId::new().0,
            user_id: recipient_id.to_string(),
            actor_id: actor_id.to_string(),
            kind: kind.as_str().to_string(),
            post_id: post_id.map(ToOwned::to_owned),
            read: false,
            created_at: Utc::now(),
        };

        self.db.insert_notification(&notification).await?;

        use crate::metrics::NOTIFICATIONS_CREATED_TOTAL;
        NOTIFICATIONS_CREATED_TOTAL
            .with_label_values(&[kind.as_str()])
            .inc();

        self.events.publish(NotificationEvent {
            recipient_id: recipient_id.to_string(),
            notification,
        });

        Ok(())
    }
}

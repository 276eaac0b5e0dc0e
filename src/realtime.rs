//! Realtime event bus
//!
//! A process-wide broadcast channel carrying notification events.
//! SSE subscribers filter by recipient; the database remains the system
//! of record, so a slow consumer that lags past the channel capacity
//! only misses live events, never stored ones.

use tokio::sync::broadcast;

use crate::data::Notification;

const DEFAULT_CAPACITY: usize = 256;

/// A notification addressed to one recipient
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    /// Recipient user ID (subscribers filter on this)
    pub recipient_id: String,
    pub notification: Notification,
}

/// Broadcast bus shared by all request handlers and SSE streams
pub struct EventBus {
    sender: broadcast::Sender<NotificationEvent>,
}

impl EventBus {
    /// Create a new bus
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(DEFAULT_CAPACITY);
        Self { sender }
    }

    /// Publish an event to all current subscribers
    ///
    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: NotificationEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to the event stream
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

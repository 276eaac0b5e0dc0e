//! Streaming API endpoints
//!
//! Provides real-time updates via Server-Sent Events (SSE)

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::BroadcastStream;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;

/// GET /api/v1/streaming/notifications
///
/// Streams the authenticated user's notifications as they happen.
/// Events are delivered best-effort: a consumer that lags past the
/// bus capacity skips the missed events and continues from the live
/// edge; the REST listing remains the system of record.
pub async fn stream_notifications(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let receiver = state.events.subscribe();
    let user_id = session.user_id.clone();

    let stream = BroadcastStream::new(receiver).filter_map(move |event| {
        let event = event.ok()?;
        if event.recipient_id != user_id {
            return None;
        }

        let payload = crate::api::notification_to_event_response(&event.notification);
        let data = serde_json::to_string(&payload).ok()?;
        Some(Ok(Event::default().event("notification").data(data)))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

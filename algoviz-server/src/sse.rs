//! Server-Sent Events stream of hub envelopes.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use tracing::{debug, warn};

use algoviz::hub::{Frame, SubscriberState};

use crate::state::AppState;

/// One SSE event per frame, named after the envelope type.
fn frame_event(frame: &Frame) -> Event {
    Event::default()
        .event(frame.kind().as_str())
        .data(frame.json())
}

/// SSE endpoint handler.
pub async fn events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Dropping the stream drops the subscription, which unregisters it.
    let mut subscription = state.hub.register();
    let subscriber_id = subscription.id();
    debug!(subscriber_id, "SSE client connected");

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("connected").data("{}"));

        while let Some(frame) = subscription.recv().await {
            yield Ok(frame_event(&frame));
        }

        if subscription.state() == SubscriberState::ForcedDrop {
            warn!(subscriber_id, "SSE client too slow, disconnecting");
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

#[cfg(test)]
mod tests {
    use algoviz::envelope::{Envelope, EnvelopeKind};
    use algoviz::hub;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn event_is_named_after_envelope_type() {
        let hub = hub::spawn(4);
        let mut sub = hub.register();
        hub.broadcast(&Envelope::new(EnvelopeKind::ExecutionError, json!({"error": "x"})));
        let frame = sub.recv().await.expect("frame");

        let rendered = format!("{:?}", frame_event(&frame));
        assert!(rendered.contains("execution_error"));
    }
}

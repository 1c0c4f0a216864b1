//! WebSocket endpoint: one hub subscription per connected client.

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use algoviz::hub::{HubHandle, SubscriberState};

use crate::state::AppState;

const PING_INTERVAL: Duration = Duration::from_secs(15);

/// GET /ws - upgrade and stream envelopes until either side goes away.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, state.hub))
}

async fn serve_socket(socket: WebSocket, hub: HubHandle) {
    let mut subscription = hub.register();
    let subscriber_id = subscription.id();
    info!(subscriber_id, "websocket client connected");

    let (mut outbound, mut inbound) = socket.split();
    let mut ping = tokio::time::interval(PING_INTERVAL);
    ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick completes immediately.
    ping.tick().await;

    loop {
        tokio::select! {
            frame = subscription.recv() => {
                let Some(frame) = frame else {
                    if subscription.state() == SubscriberState::ForcedDrop {
                        warn!(subscriber_id, "client too slow, disconnecting");
                    }
                    let _ = outbound.send(Message::Close(None)).await;
                    break;
                };
                if outbound.send(Message::Text(frame.json().to_string().into())).await.is_err() {
                    debug!(subscriber_id, "websocket send failed");
                    break;
                }
            }
            incoming = inbound.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                // Clients only listen; pongs and stray messages are ignored.
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    debug!(subscriber_id, error = %err, "websocket receive failed");
                    break;
                }
            },
            _ = ping.tick() => {
                if outbound.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    subscription.unregister();
    info!(subscriber_id, "websocket client disconnected");
}

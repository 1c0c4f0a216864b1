//! Broadcast hub: one coordination task owns every subscriber queue.
//!
//! All mutation of the subscriber set goes through a single command channel
//! processed in arrival order, so registration, removal and fan-out never
//! race. Broadcasting serializes the envelope once and attempts one
//! non-blocking enqueue per subscriber. A subscriber whose queue is full is
//! disconnected on the spot; nobody else is delayed.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::envelope::{Envelope, EnvelopeKind};

/// A serialized envelope, shared by every subscriber it is delivered to.
///
/// Carries the envelope kind alongside the JSON so transports can label a
/// frame without parsing it again.
#[derive(Debug, Clone)]
pub struct Frame {
    kind: EnvelopeKind,
    json: Arc<str>,
}

impl Frame {
    pub fn kind(&self) -> EnvelopeKind {
        self.kind
    }

    pub fn json(&self) -> &str {
        &self.json
    }
}

pub type SubscriberId = u64;

enum Command {
    Register {
        id: SubscriberId,
        queue: mpsc::Sender<Frame>,
    },
    Unregister {
        id: SubscriberId,
    },
    Broadcast {
        frame: Frame,
    },
    Count {
        reply: oneshot::Sender<usize>,
    },
}

/// Lifecycle of one subscriber, as seen from its own side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    Connecting,
    Registered,
    /// Unregistration was requested by the subscriber itself.
    Unregistering,
    /// The hub closed the queue (full, or the hub shut down).
    ForcedDrop,
    Closed,
}

/// Cheap, cloneable entry point to the hub task.
#[derive(Clone)]
pub struct HubHandle {
    commands: mpsc::UnboundedSender<Command>,
    next_id: Arc<AtomicU64>,
    queue_capacity: usize,
}

/// Start the coordination task. Must be called inside a tokio runtime.
///
/// The task ends once every handle and subscription has been dropped.
pub fn spawn(queue_capacity: usize) -> HubHandle {
    let (commands, rx) = mpsc::unbounded_channel();
    tokio::spawn(run(rx));
    info!(queue_capacity, "broadcast hub started");
    HubHandle {
        commands,
        next_id: Arc::new(AtomicU64::new(1)),
        queue_capacity: queue_capacity.max(1),
    }
}

async fn run(mut commands: mpsc::UnboundedReceiver<Command>) {
    let mut subscribers: BTreeMap<SubscriberId, mpsc::Sender<Frame>> = BTreeMap::new();

    while let Some(command) = commands.recv().await {
        match command {
            Command::Register { id, queue } => {
                subscribers.insert(id, queue);
                debug!(subscriber_id = id, total = subscribers.len(), "subscriber registered");
            }
            Command::Unregister { id } => {
                // Dropping the sender closes the subscriber's queue.
                if subscribers.remove(&id).is_some() {
                    debug!(subscriber_id = id, total = subscribers.len(), "subscriber unregistered");
                }
            }
            Command::Broadcast { frame } => {
                subscribers.retain(|id, queue| match queue.try_send(frame.clone()) {
                    Ok(()) => true,
                    Err(TrySendError::Full(_)) => {
                        warn!(subscriber_id = *id, "subscriber queue full, disconnecting");
                        false
                    }
                    Err(TrySendError::Closed(_)) => {
                        debug!(subscriber_id = *id, "subscriber gone, removing");
                        false
                    }
                });
            }
            Command::Count { reply } => {
                let _ = reply.send(subscribers.len());
            }
        }
    }
    debug!("broadcast hub stopped");
}

impl HubHandle {
    /// Add a subscriber with a bounded outbound queue.
    pub fn register(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (queue, rx) = mpsc::channel(self.queue_capacity);
        let mut subscription = Subscription {
            id,
            rx,
            state: SubscriberState::Connecting,
            commands: self.commands.clone(),
        };
        if self.commands.send(Command::Register { id, queue }).is_ok() {
            subscription.state = SubscriberState::Registered;
        } else {
            warn!(subscriber_id = id, "hub stopped, subscription closed");
            subscription.state = SubscriberState::Closed;
        }
        subscription
    }

    /// Remove a subscriber by id. Unknown or already removed ids are ignored.
    pub fn unregister(&self, id: SubscriberId) {
        let _ = self.commands.send(Command::Unregister { id });
    }

    /// Fan `envelope` out to every registered subscriber without waiting.
    pub fn broadcast(&self, envelope: &Envelope) {
        let frame = match serde_json::to_string(envelope) {
            Ok(json) => Frame {
                kind: envelope.kind,
                json: json.into(),
            },
            Err(err) => {
                warn!(error = %err, kind = envelope.kind.as_str(), "failed to serialize envelope");
                return;
            }
        };
        if self.commands.send(Command::Broadcast { frame }).is_err() {
            debug!(kind = envelope.kind.as_str(), "hub stopped, envelope discarded");
        }
    }

    /// Number of currently registered subscribers.
    pub async fn subscriber_count(&self) -> usize {
        let (reply, rx) = oneshot::channel();
        if self.commands.send(Command::Count { reply }).is_err() {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}

/// Receiving end of one subscriber. Unregisters itself when dropped.
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<Frame>,
    state: SubscriberState,
    commands: mpsc::UnboundedSender<Command>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn state(&self) -> SubscriberState {
        self.state
    }

    /// Next frame in broadcast order, or `None` once the queue is closed.
    pub async fn recv(&mut self) -> Option<Frame> {
        let frame = self.rx.recv().await;
        if frame.is_none() && self.state == SubscriberState::Registered {
            self.state = SubscriberState::ForcedDrop;
        }
        frame
    }

    /// Leave the hub. Safe to call more than once.
    pub fn unregister(&mut self) {
        match self.state {
            SubscriberState::Closed => return,
            SubscriberState::Registered | SubscriberState::ForcedDrop => {
                self.state = SubscriberState::Unregistering;
                let _ = self.commands.send(Command::Unregister { id: self.id });
            }
            SubscriberState::Connecting | SubscriberState::Unregistering => {}
        }
        self.rx.close();
        self.state = SubscriberState::Closed;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unregister();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn envelope(n: u64) -> Envelope {
        Envelope::new(EnvelopeKind::ExecutionStep, json!({ "n": n }))
    }

    fn frame_n(frame: &Frame) -> u64 {
        let value: Value = serde_json::from_str(frame.json()).expect("frame json");
        value["data"]["n"].as_u64().expect("n")
    }

    #[tokio::test]
    async fn broadcast_without_subscribers_is_a_no_op() {
        let hub = spawn(4);
        hub.broadcast(&envelope(1));
        assert_eq!(hub.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn every_subscriber_sees_broadcast_order() {
        let hub = spawn(16);
        let mut a = hub.register();
        let mut b = hub.register();
        for n in 0..5 {
            hub.broadcast(&envelope(n));
        }
        for sub in [&mut a, &mut b] {
            let mut seen = Vec::new();
            for _ in 0..5 {
                seen.push(frame_n(&sub.recv().await.expect("frame")));
            }
            assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        }
        assert_eq!(hub.subscriber_count().await, 2);
    }

    #[tokio::test]
    async fn full_queue_drops_only_that_subscriber() {
        let hub = spawn(2);
        let mut stalled = hub.register();
        let mut live = hub.register();

        for n in 0..5 {
            hub.broadcast(&envelope(n));
            let frame = live.recv().await.expect("live subscriber keeps receiving");
            assert_eq!(frame_n(&frame), n);
        }
        assert_eq!(hub.subscriber_count().await, 1);

        // The two buffered frames drain, then the queue reports closed.
        assert_eq!(frame_n(&stalled.recv().await.expect("first")), 0);
        assert_eq!(frame_n(&stalled.recv().await.expect("second")), 1);
        assert!(stalled.recv().await.is_none());
        assert_eq!(stalled.state(), SubscriberState::ForcedDrop);
        assert_eq!(live.state(), SubscriberState::Registered);
    }

    #[tokio::test]
    async fn frames_carry_their_envelope_kind() {
        let hub = spawn(4);
        let mut sub = hub.register();
        hub.broadcast(&Envelope::new(EnvelopeKind::ExecutionComplete, json!({})));

        let frame = sub.recv().await.expect("frame");
        assert_eq!(frame.kind(), EnvelopeKind::ExecutionComplete);
        let value: Value = serde_json::from_str(frame.json()).expect("frame json");
        assert_eq!(value["type"], json!("execution_complete"));
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let hub = spawn(4);
        let mut sub = hub.register();
        let id = sub.id();
        assert_eq!(hub.subscriber_count().await, 1);

        sub.unregister();
        sub.unregister();
        hub.unregister(id);
        assert_eq!(sub.state(), SubscriberState::Closed);
        assert_eq!(hub.subscriber_count().await, 0);
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn dropping_a_subscription_unregisters_it() {
        let hub = spawn(4);
        let sub = hub.register();
        let _other = hub.register();
        drop(sub);
        assert_eq!(hub.subscriber_count().await, 1);
    }
}

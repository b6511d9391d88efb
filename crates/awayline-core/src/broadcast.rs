//! Broadcast bus for distributing `GatewayEvent` to subscribed dashboards.
//!
//! Built on `tokio::sync::broadcast`, the `EventBroadcaster` supports
//! multiple concurrent subscribers. Publishing with no active subscribers
//! is a no-op. Delivery is at-least-once for connected subscribers only;
//! a subscriber that falls behind drops the oldest events and keeps going,
//! and late joiners re-fetch current state through the status command
//! instead of replaying history.

use awayline_types::event::GatewayEvent;
use tokio::sync::broadcast;

/// Multi-consumer bus for session state-change events.
///
/// Wraps a `tokio::sync::broadcast` channel. Cloning the broadcaster clones
/// the sender, allowing multiple producers and consumers.
pub struct EventBroadcaster {
    sender: broadcast::Sender<GatewayEvent>,
}

impl EventBroadcaster {
    /// Create a new broadcaster with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a new subscriber that will receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no subscribers, the event is silently dropped.
    pub fn publish(&self, event: GatewayEvent) {
        let _ = self.sender.send(event);
    }

    /// Access the underlying broadcast sender.
    pub fn sender(&self) -> &broadcast::Sender<GatewayEvent> {
        &self.sender
    }
}

impl Clone for EventBroadcaster {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl std::fmt::Debug for EventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBroadcaster")
            .field("receiver_count", &self.sender.receiver_count())
            .finish()
    }
}

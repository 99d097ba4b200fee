//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] decouples the code that records a data-request event from
//! the delivery of its notifications. Share it via `Arc<EventBus>`.

use orgnotify_core::event::NotificationEvent;
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
pub const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use orgnotify_core::event::{EventKind, NotificationEvent};
/// use orgnotify_events::EventBus;
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(NotificationEvent::new(EventKind::Created, "acme", "dr-1", "Bus stops", ""));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<NotificationEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed events are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers. Never blocks.
    ///
    /// Returns the number of subscribers that will see the event; zero
    /// means nobody is listening and the event is dropped.
    pub fn publish(&self, event: NotificationEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(dropped) => {
                tracing::warn!(
                    organization_id = %dropped.0.organization_id,
                    kind = %dropped.0.kind,
                    "No notification worker subscribed, event dropped",
                );
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

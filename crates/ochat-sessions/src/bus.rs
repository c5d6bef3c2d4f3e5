//! Change notifications for chat sessions
//!
//! The session holds plain data; front ends subscribe here and re-render on
//! each event. Built on tokio's broadcast channel, so every subscriber sees
//! every event published after it subscribed.
//!
//! # Example
//!
//! ```rust
//! use ochat_sessions::bus::{ChatEvent, EventBus};
//!
//! # tokio_test::block_on(async {
//! let bus = EventBus::new();
//! let mut subscriber = bus.subscribe();
//!
//! bus.publish(ChatEvent::TranscriptCleared);
//!
//! let event = subscriber.recv().await.unwrap();
//! assert!(matches!(event, ChatEvent::TranscriptCleared));
//! # });
//! ```

use ochat_client::ErrorNotice;
use tokio::sync::broadcast;

/// Channel capacity for broadcast events
const CHANNEL_CAPACITY: usize = 1024;

/// Something changed in a session's transcript
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// A turn was submitted and its exchange appended
    ExchangeStarted { index: usize },
    /// More response text arrived; `delta` brings the response to `len` bytes
    ResponseUpdated {
        index: usize,
        delta: String,
        len: usize,
    },
    /// The stream closed normally
    ExchangeCompleted { index: usize },
    /// The stream failed; the exchange keeps whatever text it had
    ExchangeFailed { index: usize, notice: ErrorNotice },
    /// The transcript was reset
    TranscriptCleared,
}

/// Broadcast bus for [`ChatEvent`]s. Clones share one channel.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<ChatEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create a new event bus with default capacity (1024 events)
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Lagging subscribers lose the
    /// oldest events.
    pub fn publish(&self, event: ChatEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.sender.subscribe()
    }
}

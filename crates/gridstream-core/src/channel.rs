//! Per-session publish/subscribe conduit.
//!
//! Each session owns exactly one channel (room semantics): messages
//! published here reach only the subscribers of this session, never
//! another session's. There is no backpressure: a slow consumer that
//! lags skips ahead to newer messages, which is correct for a renderer
//! that only needs the latest frame.

use gridstream_types::ServerMessage;
use tokio::sync::broadcast;

/// Buffered message count per channel before a lagging subscriber
/// starts skipping.
pub const CHANNEL_CAPACITY: usize = 256;

/// A session-scoped broadcast channel carrying control and data messages.
///
/// Cloning shares the same underlying conduit. Publishing from a single
/// runner task guarantees subscribers observe frames in non-decreasing
/// step order with no duplicates.
#[derive(Debug, Clone)]
pub struct SessionChannel {
    tx: broadcast::Sender<ServerMessage>,
}

impl SessionChannel {
    /// Creates a channel with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    /// Creates a channel with an explicit capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publishes a message to every current subscriber.
    ///
    /// Returns the number of subscribers that received it. A room with
    /// no members is not an error; the message is simply dropped.
    pub fn publish(&self, message: ServerMessage) -> usize {
        self.tx.send(message).unwrap_or(0)
    }

    /// Joins the room. The receiver observes only messages published
    /// after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.tx.subscribe()
    }

    /// Current number of room members.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SessionChannel {
    fn default() -> Self {
        Self::new()
    }
}

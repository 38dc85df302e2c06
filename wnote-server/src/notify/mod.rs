//! Real-time notifications
//!
//! - [`registry`]: the shared set of open connections and the broadcaster
//! - [`connection`]: per-connection keep-alive loop bridging a WebSocket to
//!   its registry queue
//!
//! Lifecycle of a connection: `Connecting -> Open -> Closed`. It is registered
//! when the upgrade handshake completes and unregistered on any read error,
//! close frame, write failure or shutdown. A closed connection never reopens;
//! a reconnecting client gets a new [`ConnectionId`].

pub mod connection;
pub mod registry;

pub use connection::{keep_alive, serve_socket, Disconnect};
pub use registry::{
    BroadcastReport, ConnectionId, ConnectionRegistry, Registration, SendFailure,
};

use std::sync::Arc;

/// Immutable text payload of one notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMessage(Arc<str>);

impl EventMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self(Arc::from(text.into()))
    }

    /// Notification sent after an article is persisted
    pub fn article_saved(title: &str) -> Self {
        Self::new(format!("New article saved: {}", title))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventMessage {
    fn from(text: &str) -> Self {
        Self(Arc::from(text))
    }
}

impl From<String> for EventMessage {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_saved_text() {
        let message = EventMessage::article_saved("Turing Award");
        assert_eq!(message.as_str(), "New article saved: Turing Award");
    }

    #[test]
    fn test_clones_share_payload() {
        let message = EventMessage::from("shared");
        let copy = message.clone();
        assert!(Arc::ptr_eq(&message.0, &copy.0));
    }
}

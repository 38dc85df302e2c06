//! Per-connection keep-alive loop
//!
//! One task per open connection. It reads inbound frames only to detect
//! liveness and closure (content is discarded) and writes queued broadcast
//! messages to the socket. Every way the loop can end is named by
//! [`Disconnect`], and all of them unregister the connection.

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::fmt;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::registry::{ConnectionRegistry, Registration};

/// Why a connection left the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disconnect {
    /// Peer sent a close frame (with its close code, if any)
    ClosedByPeer(Option<u16>),
    /// Inbound stream ended without a close frame
    StreamEnded,
    /// Reading or writing the socket failed
    TransportError(String),
    /// A socket write did not finish within the send timeout
    WriteTimedOut,
    /// The registry dropped this connection's queue
    Evicted,
    /// Process shutdown
    Shutdown,
}

impl Disconnect {
    /// Closure initiated by the server, which owes the peer a close frame
    fn server_initiated(&self) -> bool {
        matches!(self, Disconnect::Shutdown | Disconnect::Evicted)
    }
}

/// Run a freshly upgraded WebSocket until it closes
pub async fn serve_socket(registry: Arc<ConnectionRegistry>, socket: WebSocket) {
    let Some(registration) = registry.register() else {
        debug!("Registry is shut down, dropping new notification connection");
        return;
    };

    let (writer, reader) = socket.split();
    keep_alive(&registry, registration, reader, writer).await;
}

/// Keep one registered connection alive until it closes
///
/// Generic over the socket halves so the loop can be driven without a real
/// network connection.
pub async fn keep_alive<R, W, E>(
    registry: &ConnectionRegistry,
    registration: Registration,
    mut reader: R,
    mut writer: W,
) -> Disconnect
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
    W: Sink<Message> + Unpin,
    W::Error: fmt::Display,
{
    let Registration { id, mut outbound } = registration;
    let shutdown = registry.shutdown_token();
    let write_timeout = registry.send_timeout();

    let disconnect = loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => break Disconnect::Shutdown,

            inbound = reader.next() => match inbound {
                Some(Ok(Message::Close(frame))) => {
                    break Disconnect::ClosedByPeer(frame.map(|f| f.code));
                }
                // Liveness only
                Some(Ok(_)) => {}
                Some(Err(e)) => break Disconnect::TransportError(e.to_string()),
                None => break Disconnect::StreamEnded,
            },

            queued = outbound.recv() => match queued {
                Some(message) => {
                    let frame = Message::Text(message.as_str().to_owned());
                    match timeout(write_timeout, writer.send(frame)).await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => break Disconnect::TransportError(e.to_string()),
                        Err(_) => break Disconnect::WriteTimedOut,
                    }
                }
                None => break Disconnect::Evicted,
            },
        }
    };

    registry.unregister(id);

    match &disconnect {
        Disconnect::ClosedByPeer(code) => {
            info!(connection_id = %id, close_code = ?code, "Notification client closed connection");
        }
        Disconnect::StreamEnded => {
            info!(connection_id = %id, "Notification client disconnected");
        }
        Disconnect::TransportError(e) => {
            warn!(connection_id = %id, "Notification connection failed: {}", e);
        }
        Disconnect::WriteTimedOut => {
            warn!(connection_id = %id, "Notification write timed out after {:?}", write_timeout);
        }
        Disconnect::Evicted | Disconnect::Shutdown => {
            debug!(connection_id = %id, reason = ?disconnect, "Closing notification connection");
        }
    }

    if disconnect.server_initiated() {
        let frame = Message::Close(Some(CloseFrame {
            code: close_code::AWAY,
            reason: "server shutting down".into(),
        }));
        match timeout(write_timeout, writer.send(frame)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(connection_id = %id, "Close frame not sent: {}", e),
            Err(_) => debug!(connection_id = %id, "Close frame timed out"),
        }
    }

    disconnect
}

//! Connection registry and broadcaster
//!
//! Every open notification connection owns a bounded outbound queue. The
//! registry holds the sending half of each queue, keyed by [`ConnectionId`].
//!
//! # Locking
//!
//! The set lives behind one `std::sync::Mutex`. Register, unregister and the
//! broadcast snapshot all take that lock; it is never held across an await.
//! Broadcast copies the senders out, releases the lock, then sends
//! concurrently, so a slow connection never holds up registration.

use futures::future::join_all;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;
use wnote_common::config::{DEFAULT_OUTBOUND_QUEUE, DEFAULT_SEND_TIMEOUT_MS};

use super::EventMessage;

/// Opaque identity of one registered connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A freshly registered connection
///
/// `outbound` yields every message broadcast while the connection is
/// registered. It returns `None` once the connection has been unregistered.
#[derive(Debug)]
pub struct Registration {
    pub id: ConnectionId,
    pub outbound: mpsc::Receiver<EventMessage>,
}

/// Why a single send during broadcast failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendFailure {
    #[error("outbound queue stayed full past the send timeout")]
    TimedOut,
    #[error("connection already closed")]
    Closed,
}

/// Outcome of one broadcast call
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections registered when the broadcast started
    pub attempted: usize,
    pub delivered: usize,
    pub failures: Vec<(ConnectionId, SendFailure)>,
}

/// Set of open notification connections
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, mpsc::Sender<EventMessage>>>,
    send_timeout: Duration,
    queue_capacity: usize,
    shutdown: CancellationToken,
}

impl ConnectionRegistry {
    /// # Arguments
    ///
    /// * `send_timeout` - Bound on each per-connection send
    /// * `queue_capacity` - Outbound queue size per connection (minimum 1)
    pub fn new(send_timeout: Duration, queue_capacity: usize) -> Self {
        let queue_capacity = queue_capacity.max(1);
        info!(
            "Connection registry initialized (send timeout {:?}, queue capacity {})",
            send_timeout, queue_capacity
        );
        Self {
            connections: Mutex::new(HashMap::new()),
            send_timeout,
            queue_capacity,
            shutdown: CancellationToken::new(),
        }
    }

    fn connections(&self) -> MutexGuard<'_, HashMap<ConnectionId, mpsc::Sender<EventMessage>>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a connection whose handshake has completed
    ///
    /// Returns `None` once [`shutdown`](Self::shutdown) has been called.
    pub fn register(&self) -> Option<Registration> {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let id = ConnectionId::new();

        let count = {
            let mut connections = self.connections();
            // Checked under the lock so shutdown's clear cannot miss us
            if self.shutdown.is_cancelled() {
                return None;
            }
            connections.insert(id, tx);
            connections.len()
        };

        info!(connection_id = %id, "Notification client connected, total clients: {}", count);
        Some(Registration { id, outbound: rx })
    }

    /// Remove a connection; absent ids are ignored
    ///
    /// Returns whether the id was present.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let (removed, count) = {
            let mut connections = self.connections();
            let removed = connections.remove(&id).is_some();
            (removed, connections.len())
        };

        if removed {
            info!(connection_id = %id, "Notification client removed, total clients: {}", count);
        }
        removed
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, id: ConnectionId) -> bool {
        self.connections().contains_key(&id)
    }

    /// Number of currently registered connections
    pub fn connection_count(&self) -> usize {
        self.connections().len()
    }

    /// Send `message` to every connection registered at call time
    ///
    /// Sends run concurrently and each is bounded by the send timeout. A
    /// failed send is logged and reported; it never stops delivery to the
    /// others, is not retried, and does not unregister the connection.
    pub async fn broadcast(&self, message: impl Into<EventMessage>) -> BroadcastReport {
        let message = message.into();

        let targets: Vec<(ConnectionId, mpsc::Sender<EventMessage>)> = self
            .connections()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let sends = targets.into_iter().map(|(id, tx)| {
            let message = message.clone();
            async move {
                let result = tx.send_timeout(message, self.send_timeout).await;
                (id, result)
            }
        });
        let results = join_all(sends).await;

        let mut report = BroadcastReport {
            attempted: results.len(),
            ..Default::default()
        };

        for (id, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(SendTimeoutError::Timeout(_)) => {
                    warn!(connection_id = %id, "Broadcast send timed out after {:?}", self.send_timeout);
                    report.failures.push((id, SendFailure::TimedOut));
                }
                Err(SendTimeoutError::Closed(_)) => {
                    debug!(connection_id = %id, "Broadcast skipped closed connection");
                    report.failures.push((id, SendFailure::Closed));
                }
            }
        }

        debug!(
            "Broadcast '{}' to {}/{} clients",
            message.as_str(),
            report.delivered,
            report.attempted
        );
        report
    }

    /// Close every connection and refuse new ones
    ///
    /// Connection tasks observe the cancellation, send a close frame and exit.
    pub fn shutdown(&self) {
        let closed = {
            let mut connections = self.connections();
            self.shutdown.cancel();
            let closed = connections.len();
            connections.clear();
            closed
        };
        info!("Connection registry shut down, closed {} clients", closed);
    }

    /// True once [`shutdown`](Self::shutdown) has run
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub(crate) fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn send_timeout(&self) -> Duration {
        self.send_timeout
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS),
            DEFAULT_OUTBOUND_QUEUE,
        )
    }
}

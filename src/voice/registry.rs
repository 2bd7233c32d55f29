//! Live voice connections, one per session.

use super::events::ServerEvent;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// The peer is gone. Sending to it again is pointless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("voice connection is closed")]
pub struct ConnectionClosed;

/// Outbound half of a voice connection.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send(&self, event: ServerEvent) -> Result<(), ConnectionClosed>;
}

/// Sink that drops everything. Used for turns that run without a connection.
pub struct DiscardSink;

#[async_trait]
impl EventSink for DiscardSink {
    async fn send(&self, _event: ServerEvent) -> Result<(), ConnectionClosed> {
        Ok(())
    }
}

struct Registration {
    connection_id: Uuid,
    sink: Arc<dyn EventSink>,
}

/// Session id → live connection.
///
/// A second connection for the same session replaces the first (last writer wins).
/// Each registration carries a connection id so that the replaced connection's
/// disconnect cannot remove its successor.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<String, Registration>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Registration>> {
        self.connections.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, session_id: &str, connection_id: Uuid, sink: Arc<dyn EventSink>) {
        let previous = self
            .lock()
            .insert(session_id.to_string(), Registration { connection_id, sink });

        match previous {
            Some(old) => info!(
                session_id,
                %connection_id,
                replaced = %old.connection_id,
                "Voice connection replaced an existing registration"
            ),
            None => info!(session_id, %connection_id, "Voice connection registered"),
        }
    }

    /// Remove the registration only if it still belongs to `connection_id`.
    pub fn deregister(&self, session_id: &str, connection_id: Uuid) -> bool {
        let mut connections = self.lock();
        match connections.get(session_id) {
            Some(current) if current.connection_id == connection_id => {
                connections.remove(session_id);
                debug!(session_id, %connection_id, "Voice connection deregistered");
                true
            }
            _ => false,
        }
    }

    pub fn is_connected(&self, session_id: &str) -> bool {
        self.lock().contains_key(session_id)
    }

    pub fn connection_count(&self) -> usize {
        self.lock().len()
    }

    /// Best-effort delivery to the session's live connection, if any.
    ///
    /// Returns whether the event was delivered. A failed send deregisters the connection.
    pub async fn send_to(&self, session_id: &str, event: ServerEvent) -> bool {
        // Clone the sink out so the lock is not held across the send.
        let target = self
            .lock()
            .get(session_id)
            .map(|r| (r.connection_id, r.sink.clone()));

        let Some((connection_id, sink)) = target else {
            return false;
        };

        match sink.send(event).await {
            Ok(()) => true,
            Err(ConnectionClosed) => {
                self.deregister(session_id, connection_id);
                false
            }
        }
    }
}

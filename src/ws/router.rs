use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::models::{ConnectionId, ServerEvent};
use crate::ws::registry::SessionRegistry;

/// Events a connection may have queued before further ones are dropped.
pub const OUTBOUND_CAPACITY: usize = 256;

/// Receiving end of a connection's outbound queue.
pub type Outbound = mpsc::Receiver<Arc<ServerEvent>>;

/// Delivers events to session members or single connections.
///
/// Every connection owns exactly one ordered queue, so two events handed to
/// the router for the same recipient arrive in submission order. Sends never
/// wait: a recipient that is gone or too far behind misses the event.
pub struct BroadcastRouter {
    registry: Arc<SessionRegistry>,
    capacity: usize,
    peers: RwLock<HashMap<ConnectionId, mpsc::Sender<Arc<ServerEvent>>>>,
}

impl BroadcastRouter {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self::with_capacity(registry, OUTBOUND_CAPACITY)
    }

    pub fn with_capacity(registry: Arc<SessionRegistry>, capacity: usize) -> Self {
        Self {
            registry,
            capacity,
            peers: RwLock::new(HashMap::new()),
        }
    }

    /// Open the outbound queue for a connection.
    pub fn register(&self, connection_id: &str) -> Outbound {
        let (tx, rx) = mpsc::channel(self.capacity);
        let replaced = self
            .peers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(connection_id.to_string(), tx);
        if replaced.is_some() {
            warn!("Connection {} registered twice, previous queue dropped", connection_id);
        }
        rx
    }

    /// Close the outbound queue for a connection. Returns false if unknown.
    pub fn unregister(&self, connection_id: &str) -> bool {
        self.peers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(connection_id)
            .is_some()
    }

    pub fn connection_count(&self) -> usize {
        self.peers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Deliver an event to one connection.
    pub fn unicast(&self, connection_id: &str, event: ServerEvent) -> bool {
        self.send(connection_id, Arc::new(event))
    }

    /// Deliver an event to every member of a session except `exclude`.
    /// Returns the number of recipients the event was queued for.
    pub fn broadcast(&self, session_id: &str, event: ServerEvent, exclude: Option<&str>) -> usize {
        // Snapshot first; the registry lock is released before any send.
        let roster = self.registry.roster(session_id);
        let event = Arc::new(event);
        let mut delivered = 0;
        for member in roster
            .iter()
            .filter(|m| Some(m.connection_id.as_str()) != exclude)
        {
            if self.send(&member.connection_id, event.clone()) {
                delivered += 1;
            }
        }
        debug!("Broadcast to session {} reached {} member(s)", session_id, delivered);
        delivered
    }

    fn send(&self, connection_id: &str, event: Arc<ServerEvent>) -> bool {
        let tx = self
            .peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(connection_id)
            .cloned();
        let Some(tx) = tx else {
            debug!("Dropping event for unknown connection {}", connection_id);
            return false;
        };
        match tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("Outbound queue full for {}, event dropped", connection_id);
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Outbound queue closed for {}, event dropped", connection_id);
                false
            }
        }
    }
}

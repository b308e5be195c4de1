use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::types::{Connection, ConnectionId};

/// Set of live connections keyed by id.
///
/// Cloning is cheap and every clone shares the same map. The lock is only ever
/// held for the map operation itself; callers get owned [`Connection`] handles
/// back and send outside the lock.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    connections: Arc<RwLock<HashMap<ConnectionId, Connection>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection. A second registration under the same id replaces the
    /// first (last write wins).
    pub async fn register(&self, conn: Connection) {
        let id = conn.id();
        let previous = self.connections.write().await.insert(id, conn);
        if previous.is_some() {
            warn!("Duplicate registration for connection {}, replacing", id);
        } else {
            debug!("Connection {} registered", id);
        }
    }

    /// Remove a connection. Returns false if it was already gone.
    pub async fn unregister(&self, id: &ConnectionId) -> bool {
        let removed = self.connections.write().await.remove(id).is_some();
        if removed {
            debug!("Connection {} unregistered", id);
        }
        removed
    }

    pub async fn lookup(&self, id: &ConnectionId) -> Option<Connection> {
        self.connections.read().await.get(id).cloned()
    }

    /// Snapshot of every connection other than `id`, in no particular order.
    pub async fn all_except(&self, id: &ConnectionId) -> Vec<Connection> {
        self.connections
            .read()
            .await
            .values()
            .filter(|conn| conn.id() != *id)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }
}

//! Connection registry — the single owner of connection membership.
//!
//! All mutation goes through `add`/`remove`; transports and the heartbeat
//! monitor never track connections on the side. `broadcast` iterates a
//! snapshot, so a connection dying mid-broadcast cannot skip or duplicate a
//! send to any other connection.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::transport::Frame;

use super::handle::{ConnectionHandle, ConnectionId};

/// Thread-safe set of all currently-open client connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Add a connection.
    pub fn add(&self, handle: Arc<ConnectionHandle>) {
        self.connections.insert(handle.id, handle);
    }

    /// Remove a connection, returning its handle if it was present.
    pub fn remove(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.connections.remove(conn_id).map(|(_, handle)| handle)
    }

    /// Look up a connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.connections.get(conn_id).map(|e| Arc::clone(e.value()))
    }

    /// Number of open connections.
    pub fn count(&self) -> usize {
        self.connections.len()
    }

    /// Copy of the current connection set.
    pub fn snapshot(&self) -> Vec<Arc<ConnectionHandle>> {
        self.connections
            .iter()
            .map(|e| Arc::clone(e.value()))
            .collect()
    }

    /// Run `f` over a snapshot of the connection set.
    pub fn for_each(&self, mut f: impl FnMut(&Arc<ConnectionHandle>)) {
        for handle in self.snapshot() {
            f(&handle);
        }
    }

    /// Send one encoded frame to every connection.
    ///
    /// A failed send removes that connection and the broadcast continues;
    /// one bad socket never aborts delivery to the rest. Returns how many
    /// connections accepted the frame.
    pub fn broadcast(&self, frame: &str) -> usize {
        let mut delivered = 0;
        for handle in self.snapshot() {
            if handle.send(Frame::Data(frame.to_owned())) {
                delivered += 1;
            } else {
                handle.mark_dead();
                self.connections.remove(&handle.id);
                debug!(conn_id = %handle.id, "dropped dead connection during broadcast");
            }
        }
        delivered
    }

    /// Drain the registry: queue a close on every entry, mark it dead, and
    /// clear the set. Used on server shutdown.
    pub fn close_all(&self) {
        for handle in self.snapshot() {
            let _ = handle.send(Frame::Close);
            handle.mark_dead();
            self.connections.remove(&handle.id);
        }
    }
}

//! Shared registry of attached WebSocket sessions.
//!
//! The registry holds the only sender half of each session's outbound
//! queue, so removing a session from the live set closes the queue, which
//! ends the session's socket writer and with it the transport. Replay and
//! broadcast go through the same per-session FIFO queue; a replay queued
//! after registration is therefore at least as new as any incremental
//! already ahead of it, and the client converges once it applies the
//! replay.

use std::collections::HashMap;

use ipkvm_core::events::{ServerMessage, StateEvent};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::session::Session;

/// All currently attached clients.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, Session>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attached sessions.
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Whether no session is attached.
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Attach a session. It observes broadcasts from this point on; the
    /// caller is expected to queue a full-state replay next.
    pub fn register(&self, session: Session) {
        info!(id = %session.id, user = %session.user, "client attached");
        let _ = self.sessions.lock().insert(session.id, session);
    }

    /// Queue a full-state replay to one attached session. The snapshots
    /// must be fetched after [`register`](Self::register) so they are never
    /// older than an incremental already in the queue. A session whose
    /// queue rejects the replay is dropped; returns whether the session is
    /// still attached.
    pub fn replay(&self, id: Uuid, snapshots: Vec<(StateEvent, Value)>) -> bool {
        let mut sessions = self.sessions.lock();
        if !sessions.contains_key(&id) {
            return false;
        }
        for (event, attrs) in snapshots {
            let queued = sessions
                .get(&id)
                .is_some_and(|session| session.try_send(ServerMessage::event(event, attrs)).is_ok());
            if !queued {
                warn!(id = %id, "session queue rejected replay, dropping client");
                let _ = sessions.remove(&id);
                return false;
            }
        }
        true
    }

    /// Queue a message to one session, if still attached.
    pub fn send_to(&self, id: Uuid, msg: ServerMessage) -> bool {
        self.sessions
            .lock()
            .get(&id)
            .is_some_and(|session| session.try_send(msg).is_ok())
    }

    /// Detach a session, if still present.
    pub fn remove(&self, id: Uuid) -> Option<Session> {
        let removed = self.sessions.lock().remove(&id);
        if let Some(session) = &removed {
            info!(id = %session.id, user = %session.user, "client detached");
        }
        removed
    }

    /// Push one domain snapshot to every attached session. Sessions whose
    /// queue is full or closed are dropped, which closes their transport;
    /// everyone else is unaffected. Returns the ids of the dropped
    /// sessions.
    pub fn broadcast(&self, event: StateEvent, attrs: &Value) -> Vec<Uuid> {
        let mut sessions = self.sessions.lock();
        let mut dead = Vec::new();
        for session in sessions.values() {
            if session
                .try_send(ServerMessage::event(event, attrs.clone()))
                .is_err()
            {
                dead.push(session.id);
            }
        }
        for id in &dead {
            if sessions.remove(id).is_some() {
                warn!(id = %id, "dropping unresponsive client");
            }
        }
        dead
    }

    /// Drop sessions whose socket writer has already gone away (socket
    /// error without a clean detach). Returns the ids of the reaped ones.
    pub fn reap_closed(&self) -> Vec<Uuid> {
        let mut sessions = self.sessions.lock();
        let dead: Vec<Uuid> = sessions
            .values()
            .filter(|s| s.is_closed())
            .map(|s| s.id)
            .collect();
        for id in &dead {
            if sessions.remove(id).is_some() {
                warn!(id = %id, "reaping dead client");
            }
        }
        dead
    }

    /// Detach every session. Dropping the records closes their outbound
    /// queues, which ends each writer task and closes the socket.
    pub fn close_all(&self) -> usize {
        let drained: Vec<Session> = self.sessions.lock().drain().map(|(_, s)| s).collect();
        if !drained.is_empty() {
            info!(count = drained.len(), "closing all client sessions");
        }
        drained.len()
    }
}

//! A single attached WebSocket client.

use ipkvm_core::events::ServerMessage;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Outbound queue depth per session. A client that cannot drain this many
/// pending messages is considered dead and gets dropped by the registry.
pub const SESSION_QUEUE_DEPTH: usize = 256;

/// Registry-side record of one attached client.
///
/// Deliberately not `Clone`: the registry holds the only sender, so
/// dropping a session out of the live set closes its outbound queue and
/// with it the socket writer.
#[derive(Debug)]
pub struct Session {
    /// Stable identifier, also used in log lines.
    pub id: Uuid,
    /// Authenticated username the socket was opened with.
    pub user: String,
    tx: mpsc::Sender<ServerMessage>,
}

impl Session {
    /// Create a session and the receiving half of its outbound queue.
    pub fn new(user: String) -> (Self, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(SESSION_QUEUE_DEPTH);
        let session = Self {
            id: Uuid::now_v7(),
            user,
            tx,
        };
        (session, rx)
    }

    /// Queue a message without waiting. Fails when the queue is full or the
    /// writer side has gone away.
    pub fn try_send(&self, msg: ServerMessage) -> Result<(), ()> {
        self.tx.try_send(msg).map_err(|_| ())
    }

    /// Whether the socket writer has dropped its receiving half.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

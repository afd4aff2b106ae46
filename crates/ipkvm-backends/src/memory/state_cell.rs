//! Watch-channel cell backing `get_state`/`poll_state` for memory backends.

use serde_json::Value;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::StateStream;

/// Holds the current state snapshot and notifies every poller on change.
pub(crate) struct StateCell {
    tx: watch::Sender<Value>,
}

impl StateCell {
    pub(crate) fn new(initial: Value) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub(crate) fn get(&self) -> Value {
        self.tx.borrow().clone()
    }

    pub(crate) fn set(&self, value: Value) {
        // send_replace never fails even with zero receivers.
        let _ = self.tx.send_replace(value);
    }

    /// Live stream: yields the current snapshot immediately, then one per
    /// change. Stays open as long as the backend exists.
    pub(crate) fn stream(&self) -> StateStream {
        Box::pin(WatchStream::new(self.tx.subscribe()))
    }
}

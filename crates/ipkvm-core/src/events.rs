//! WebSocket wire envelopes.
//!
//! Server → client pushes are `{"msg_type": "event", "msg": {"event": ...,
//! "event_attrs": {...}}}` (plus `{"msg_type": "pong"}` replies). Client →
//! server control messages are tagged by `event_type`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// State domains fanned out over the event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateEvent {
    /// Aggregate version/meta info.
    InfoState,
    /// Human-interface emulator state.
    HidState,
    /// Power-control unit state.
    AtxState,
    /// Mass-storage emulator state.
    MsdState,
    /// Video streamer state.
    StreamerState,
}

impl StateEvent {
    /// All domains in replay order (full-state snapshot on connect).
    pub const ALL: [StateEvent; 5] = [
        StateEvent::InfoState,
        StateEvent::HidState,
        StateEvent::AtxState,
        StateEvent::MsdState,
        StateEvent::StreamerState,
    ];
}

/// Body of an event push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBody {
    /// Which state domain changed.
    pub event: StateEvent,
    /// The domain's full state snapshot.
    pub event_attrs: Value,
}

/// Server → client message envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "msg_type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A state-change (or replay) event.
    Event {
        /// Event body.
        msg: EventBody,
    },
    /// Reply to a client `ping`.
    Pong,
}

impl ServerMessage {
    /// Build an event push for one domain snapshot.
    pub fn event(event: StateEvent, event_attrs: Value) -> Self {
        Self::Event {
            msg: EventBody { event, event_attrs },
        }
    }
}

/// Mouse coordinate pair used by move events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MousePos {
    /// Horizontal coordinate.
    pub x: i64,
    /// Vertical coordinate.
    pub y: i64,
}

/// Client → server control messages, tagged by `event_type`.
///
/// Field values arrive loosely typed (`Value`) and are validated at
/// dispatch; a bad value drops the event without closing the session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Liveness check; the server replies with a pong envelope.
    Ping,
    /// Key press or release.
    Key {
        /// Key name.
        key: String,
        /// Pressed state (bool or bool-like string).
        state: Value,
    },
    /// Absolute pointer move.
    MouseMove {
        /// Target coordinates.
        to: MousePos,
    },
    /// Pointer button press or release.
    MouseButton {
        /// Button name.
        button: String,
        /// Pressed state (bool or bool-like string).
        state: Value,
    },
    /// Wheel scroll.
    MouseWheel {
        /// Scroll deltas.
        delta: MousePos,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_envelope_shape() {
        let msg = ServerMessage::event(StateEvent::HidState, json!({"online": true}));
        let wire = serde_json::to_value(&msg).unwrap();
        assert_eq!(wire["msg_type"], "event");
        assert_eq!(wire["msg"]["event"], "hid_state");
        assert_eq!(wire["msg"]["event_attrs"]["online"], true);
    }

    #[test]
    fn pong_envelope_shape() {
        let wire = serde_json::to_value(&ServerMessage::Pong).unwrap();
        assert_eq!(wire, json!({"msg_type": "pong"}));
    }

    #[test]
    fn replay_order_is_stable() {
        assert_eq!(StateEvent::ALL[0], StateEvent::InfoState);
        assert_eq!(StateEvent::ALL[4], StateEvent::StreamerState);
    }

    #[test]
    fn parse_ping() {
        let ev: ClientEvent = serde_json::from_value(json!({"event_type": "ping"})).unwrap();
        assert_eq!(ev, ClientEvent::Ping);
    }

    #[test]
    fn parse_key_event() {
        let ev: ClientEvent =
            serde_json::from_value(json!({"event_type": "key", "key": "KeyA", "state": true}))
                .unwrap();
        match ev {
            ClientEvent::Key { key, state } => {
                assert_eq!(key, "KeyA");
                assert_eq!(state, json!(true));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn parse_mouse_move() {
        let ev: ClientEvent = serde_json::from_value(
            json!({"event_type": "mouse_move", "to": {"x": 100, "y": -7}}),
        )
        .unwrap();
        assert_eq!(ev, ClientEvent::MouseMove { to: MousePos { x: 100, y: -7 } });
    }

    #[test]
    fn unknown_event_type_is_an_error() {
        let result: Result<ClientEvent, _> =
            serde_json::from_value(json!({"event_type": "self_destruct"}));
        assert!(result.is_err());
    }
}

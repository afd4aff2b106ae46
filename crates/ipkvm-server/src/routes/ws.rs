//! WebSocket attach point: full-state replay, event fan-in, heartbeat.

use std::time::Duration;

use axum::Extension;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use ipkvm_core::errors::ApiResult;
use ipkvm_core::events::{ClientEvent, ServerMessage, StateEvent};
use ipkvm_core::validators::{
    valid_bool_value, valid_hid_key, valid_hid_mouse_button, valid_hid_mouse_move,
    valid_hid_mouse_wheel,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use super::info::info_state;
use crate::auth::AuthInfo;
use crate::server::AppState;
use crate::ws::Session;

/// `GET /ws` — upgrade and attach.
pub async fn attach(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(state, socket, auth.user))
}

/// Snapshot every domain for the connect-time replay, in replay order.
pub async fn collect_replay(state: &AppState) -> Vec<(StateEvent, Value)> {
    vec![
        (StateEvent::InfoState, info_state(state).await),
        (StateEvent::HidState, state.hid.get_state().await),
        (StateEvent::AtxState, state.atx.get_state().await),
        (StateEvent::MsdState, state.msd.device().get_state().await),
        (
            StateEvent::StreamerState,
            state.streamer.get_state().await,
        ),
    ]
}

async fn handle_socket(state: AppState, socket: WebSocket, user: String) {
    let (session, rx) = Session::new(user);
    let id = session.id;
    state.registry.register(session);
    // Snapshots are fetched after registration: an event published while
    // they are being collected lands in the queue first, and the replay
    // queued behind it is at least as new, so the client converges once it
    // applies the replay.
    let snapshots = collect_replay(&state).await;
    let attached = state.registry.replay(id, snapshots);

    let (sink, stream) = socket.split();
    let heartbeat = Duration::from_secs(state.config.heartbeat_secs);
    let mut writer = tokio::spawn(write_loop(sink, rx, heartbeat));

    if attached {
        // Reading stops when the client goes away, or when the registry
        // drops the session and the writer exits after closing the socket.
        tokio::select! {
            () = read_loop(&state, id, stream) => {}
            _ = &mut writer => {}
        }
    }

    // Released keys before detach, as a vanished client must not leave
    // input stuck down.
    state.hid.clear_events().await;
    let _ = state.registry.remove(id);
    if !writer.is_finished() {
        let _ = writer.await;
    }
}

async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<ServerMessage>,
    heartbeat: Duration,
) {
    let mut ticker = tokio::time::interval(heartbeat);
    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Some(msg) => {
                    let Ok(text) = serde_json::to_string(&msg) else { continue };
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        return;
                    }
                }
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    return;
                }
            },
            _ = ticker.tick() => {
                if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                    return;
                }
            }
        }
    }
}

async fn read_loop(state: &AppState, id: Uuid, mut stream: SplitStream<WebSocket>) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                dispatch_client_event(state, id, text.as_str()).await;
            }
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }
}

/// Parse and apply one inbound event. A malformed or invalid event is
/// dropped with a debug line; it never closes the session.
async fn dispatch_client_event(state: &AppState, id: Uuid, text: &str) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(err) => {
            debug!(%id, %err, "unparseable client event");
            return;
        }
    };
    if let Err(err) = apply_client_event(state, id, event).await {
        debug!(%id, %err, "client event dropped");
    }
}

async fn apply_client_event(state: &AppState, id: Uuid, event: ClientEvent) -> ApiResult<()> {
    match event {
        ClientEvent::Ping => {
            let _ = state.registry.send_to(id, ServerMessage::Pong);
            Ok(())
        }
        ClientEvent::Key { key, state: pressed } => {
            let key = valid_hid_key(&key)?;
            let pressed = valid_bool_value(&pressed)?;
            state.hid.send_key_event(&key, pressed).await
        }
        ClientEvent::MouseMove { to } => {
            let x = valid_hid_mouse_move(to.x)?;
            let y = valid_hid_mouse_move(to.y)?;
            state.hid.send_mouse_move_event(x, y).await
        }
        ClientEvent::MouseButton { button, state: pressed } => {
            let button = valid_hid_mouse_button(&button)?;
            let pressed = valid_bool_value(&pressed)?;
            state.hid.send_mouse_button_event(&button, pressed).await
        }
        ClientEvent::MouseWheel { delta } => {
            let dx = valid_hid_mouse_wheel(delta.x)?;
            let dy = valid_hid_mouse_wheel(delta.y)?;
            state.hid.send_mouse_wheel_event(dx, dy).await
        }
    }
}

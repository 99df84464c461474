//! WebSocket endpoint streaming session events.
//!
//! On connect the client receives one snapshot immediately, then every event
//! the session driver broadcasts. The stream ends when the session closes or
//! the client disconnects.

use crate::api::server::AppState;
use crate::api::sessions::SessionEvent;
use crate::engine::SessionSnapshot;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use uuid::Uuid;

pub async fn session_stream(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Response {
    let Some(handle) = state.registry.get(&session_id) else {
        return (StatusCode::NOT_FOUND, "session not found").into_response();
    };

    let snapshot = handle.session.lock().await.snapshot();
    let events = BroadcastStream::new(handle.subscribe());
    ws.on_upgrade(move |socket| handle_socket(socket, session_id, snapshot, events))
}

async fn handle_socket(
    socket: WebSocket,
    session_id: Uuid,
    initial: SessionSnapshot,
    mut events: BroadcastStream<SessionEvent>,
) {
    let (mut sender, mut receiver) = socket.split();

    let hello = SessionEvent::Tick { snapshot: initial };
    if send_event(&mut sender, &hello).await.is_err() {
        return;
    }
    tracing::debug!(session_id = %session_id, "websocket connected");

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(Ok(event)) => {
                    if send_event(&mut sender, &event).await.is_err() {
                        break;
                    }
                }
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    // A slow client missed events; the next tick carries a
                    // full snapshot, so just note it and keep going.
                    tracing::debug!(session_id = %session_id, skipped, "websocket lagged");
                }
                // Session closed: the driver's sender is gone.
                None => break,
            },
            message = receiver.next() => match message {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // Inbound frames are ignored; game actions go over HTTP.
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::debug!(session_id = %session_id, "websocket disconnected");
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &SessionEvent,
) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(event).map_err(axum::Error::new)?;
    sender.send(Message::Text(payload)).await
}

//! WebSocket upgrade handler for change subscribers.
//!
//! Manages the connection lifecycle:
//! 1. Upgrade to WebSocket
//! 2. Join the change topic
//! 3. Forward every change envelope, answer pings, report lag
//! 4. Leave the topic on disconnect
//!
//! Every write to the socket is bounded by the hub's write timeout. A
//! subscriber that cannot keep up is disconnected instead of holding up
//! anything else.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{Sink, SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};

use super::{
    hub::{ClientId, SubscriberHub},
    messages::{ClientMessage, ServerMessage},
};

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub hub: Arc<SubscriberHub>,
    /// Topic every connection on this route joins.
    pub topic: Arc<str>,
}

impl WebSocketState {
    pub fn new(hub: Arc<SubscriberHub>, topic: impl Into<Arc<str>>) -> Self {
        Self {
            hub,
            topic: topic.into(),
        }
    }
}

/// Why a write to a subscriber did not go through.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("write timed out after {0:?}")]
    TimedOut(Duration),

    #[error("socket closed: {0}")]
    Closed(String),
}

/// Handle WebSocket upgrade requests for the change stream.
///
/// Route: `GET /ws/changes`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WebSocketState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection until either side goes away.
async fn handle_socket(socket: WebSocket, state: WebSocketState) {
    let (mut sender, mut receiver) = socket.split();
    let client_id = ClientId::new();
    let write_timeout = state.hub.write_timeout();

    let mut changes = state.hub.join(&state.topic, client_id.clone()).await;
    tracing::debug!(client_id = %client_id, topic = %state.topic, "Subscriber connected");

    let connected = ServerMessage::connected(&state.topic, &client_id);
    if let Err(e) = send_with_timeout(&mut sender, to_frame(&connected), write_timeout).await {
        tracing::debug!(client_id = %client_id, error = %e, "Failed to send connected message");
        drop(changes);
        state.hub.leave(&client_id).await;
        return;
    }

    // Replies to client frames go through the send loop so there is one writer
    let (control_tx, mut control_rx) = mpsc::channel::<ServerMessage>(8);

    let send_client_id = client_id.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                change = changes.recv() => match change {
                    Ok(envelope) => Message::Text(envelope.to_string()),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(
                            client_id = %send_client_id,
                            missed,
                            "Subscriber lagged, oldest change events dropped"
                        );
                        to_frame(&ServerMessage::lagged(missed))
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                control = control_rx.recv() => match control {
                    Some(message) => to_frame(&message),
                    None => break,
                },
            };

            if let Err(e) = send_with_timeout(&mut sender, frame, write_timeout).await {
                tracing::debug!(
                    client_id = %send_client_id,
                    error = %e,
                    "Disconnecting subscriber"
                );
                break;
            }
        }
    });

    let recv_client_id = client_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Ping) => {
                        if control_tx.send(ServerMessage::pong()).await.is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        tracing::debug!(client_id = %recv_client_id, "Ignoring unrecognized client message");
                    }
                },
                Ok(Message::Close(_)) => {
                    tracing::debug!(client_id = %recv_client_id, "Client sent close frame");
                    break;
                }
                // Protocol pings are answered by axum; binary frames are ignored
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(client_id = %recv_client_id, error = %e, "Receive error");
                    break;
                }
            }
        }
    });

    // Wait for either task to finish. The aborted task is awaited too, so the
    // broadcast receiver is gone before we leave the topic.
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
            let _ = recv_task.await;
        }
        _ = &mut recv_task => {
            send_task.abort();
            let _ = send_task.await;
        }
    }

    state.hub.leave(&client_id).await;
    tracing::debug!(client_id = %client_id, "Subscriber disconnected");
}

fn to_frame(message: &ServerMessage) -> Message {
    // Control messages contain only strings and integers
    let json = serde_json::to_string(message).unwrap_or_default();
    Message::Text(json)
}

/// Write one frame, giving up after `timeout`.
pub async fn send_with_timeout<S>(
    sink: &mut S,
    frame: Message,
    timeout: Duration,
) -> Result<(), WriteError>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    match tokio::time::timeout(timeout, sink.send(frame)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(WriteError::Closed(e.to_string())),
        Err(_) => Err(WriteError::TimedOut(timeout)),
    }
}

/// Create axum router for the change stream endpoint.
///
/// # Example
///
/// ```ignore
/// let app = websocket_router().with_state(WebSocketState::new(hub, "changes"));
/// ```
pub fn websocket_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new().route("/ws/changes", get(ws_handler))
}

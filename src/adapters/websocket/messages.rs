//! WebSocket control frames exchanged with change subscribers.
//!
//! Change envelopes themselves are forwarded as-is; these types only cover
//! the frames the transport adds around them:
//! - Server → Client: connection status, lag notices, heartbeat replies
//! - Client → Server: heartbeats

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

// ============================================
// Server → Client Messages
// ============================================

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Subscription established.
    Connected(ConnectedMessage),

    /// The subscriber fell behind and skipped events; it should re-read
    /// whatever it displays.
    Lagged(LaggedMessage),

    /// Heartbeat response.
    Pong(PongMessage),
}

impl ServerMessage {
    pub fn connected(topic: &str, client_id: impl ToString) -> Self {
        ServerMessage::Connected(ConnectedMessage {
            topic: topic.to_string(),
            client_id: client_id.to_string(),
            timestamp: now_millis(),
        })
    }

    pub fn lagged(missed: u64) -> Self {
        ServerMessage::Lagged(LaggedMessage {
            missed,
            timestamp: now_millis(),
        })
    }

    pub fn pong() -> Self {
        ServerMessage::Pong(PongMessage {
            timestamp: now_millis(),
        })
    }
}

fn now_millis() -> i64 {
    Timestamp::now().epoch_millis()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMessage {
    pub topic: String,
    pub client_id: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaggedMessage {
    /// Number of change events this subscriber never received.
    pub missed: u64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PongMessage {
    pub timestamp: i64,
}

// ============================================
// Client → Server Messages
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Heartbeat request.
    Ping,
}

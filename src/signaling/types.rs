use std::fmt;

use rand::Rng;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Utf8Bytes};

/// Signaling relay errors
#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("unknown target: {0}")]
    UnknownTarget(ConnectionId),

    #[error("channel closed for connection {0}")]
    ChannelClosed(ConnectionId),

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
}

const CONNECTION_ID_CHARS: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
pub(crate) const CONNECTION_ID_LEN: usize = 20;

/// Connection ID: up to 20 bytes, stored inline so it stays `Copy`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId {
    bytes: [u8; CONNECTION_ID_LEN],
    len: u8,
}

impl ConnectionId {
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let mut bytes = [0u8; CONNECTION_ID_LEN];
        for byte in &mut bytes {
            *byte = CONNECTION_ID_CHARS[rng.random_range(0..CONNECTION_ID_CHARS.len())];
        }
        Self {
            bytes,
            len: CONNECTION_ID_LEN as u8,
        }
    }

    /// Parse an id received from a client. Empty or oversized ids are rejected
    /// rather than truncated, so they can never alias a live connection.
    pub fn parse(s: &str) -> Option<Self> {
        let src = s.as_bytes();
        if src.is_empty() || src.len() > CONNECTION_ID_LEN {
            return None;
        }
        let mut bytes = [0u8; CONNECTION_ID_LEN];
        bytes[..src.len()].copy_from_slice(src);
        Some(Self {
            bytes,
            len: src.len() as u8,
        })
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ConnectionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ConnectionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ConnectionId::parse(&s)
            .ok_or_else(|| D::Error::custom(format!("invalid connection id: {:?}", s)))
    }
}

/// Wrapper for outbound WebSocket messages using tungstenite's Utf8Bytes.
#[derive(Debug, Clone)]
pub struct OutboundMessage(Utf8Bytes);

impl OutboundMessage {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Get the inner Utf8Bytes for tungstenite Message::Text
    pub fn into_inner(self) -> Utf8Bytes {
        self.0
    }
}

impl From<String> for OutboundMessage {
    fn from(s: String) -> Self {
        Self(Utf8Bytes::from(s))
    }
}

/// One live peer session: its id and the sending half of its outbound channel.
///
/// The receiving half belongs to the connection's writer task; once that task
/// ends, sends through this handle fail with [`SignalingError::ChannelClosed`].
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl Connection {
    pub fn new(id: ConnectionId, tx: mpsc::UnboundedSender<OutboundMessage>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn send(&self, msg: OutboundMessage) -> Result<(), SignalingError> {
        self.tx
            .send(msg)
            .map_err(|_| SignalingError::ChannelClosed(self.id))
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::types::{ConnectionId, OutboundMessage, SignalingError};

/// Inbound wire envelope: `{"event": ..., "data": ...}`
#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct OfferData {
    offer: Value,
}

#[derive(Debug, Deserialize)]
struct IceCandidateData {
    id: ConnectionId,
    candidate: Value,
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Announce readiness to negotiate; every other peer learns our id
    Join,

    /// Session description to broadcast to every other peer
    Offer { offer: Value },

    /// Reply to one peer's offer. `payload` is the data object minus the
    /// routing `id`.
    Answer {
        target: ConnectionId,
        payload: Map<String, Value>,
    },

    /// Connectivity candidate for one peer
    IceCandidate {
        target: ConnectionId,
        candidate: Value,
    },
}

impl ClientMessage {
    /// Parse one inbound text frame.
    pub fn parse(text: &str) -> Result<Self, SignalingError> {
        let envelope: Envelope = serde_json::from_str(text)
            .map_err(|e| SignalingError::Malformed(format!("invalid envelope: {}", e)))?;

        match envelope.event.as_str() {
            "join" => Ok(ClientMessage::Join),
            "offer" => {
                let data: OfferData = serde_json::from_value(envelope.data)
                    .map_err(|e| SignalingError::Malformed(format!("offer: {}", e)))?;
                Ok(ClientMessage::Offer { offer: data.offer })
            }
            "answer" => {
                let Value::Object(mut payload) = envelope.data else {
                    return Err(SignalingError::Malformed(
                        "answer: data must be an object".to_string(),
                    ));
                };
                let target = payload
                    .remove("id")
                    .and_then(|id| id.as_str().and_then(ConnectionId::parse))
                    .ok_or_else(|| {
                        SignalingError::Malformed("answer: missing or invalid id".to_string())
                    })?;
                Ok(ClientMessage::Answer { target, payload })
            }
            "ice-candidate" => {
                let data: IceCandidateData = serde_json::from_value(envelope.data)
                    .map_err(|e| SignalingError::Malformed(format!("ice-candidate: {}", e)))?;
                Ok(ClientMessage::IceCandidate {
                    target: data.id,
                    candidate: data.candidate,
                })
            }
            other => Err(SignalingError::Malformed(format!("unknown event: {}", other))),
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Sent once to a new connection, carrying its own id
    Connected(ConnectionId),

    /// Another peer sent `join`
    UserJoined(ConnectionId),

    /// Offer blob from some other peer
    Offer(Value),

    /// Answer payload; `id` holds the answering peer
    Answer(Map<String, Value>),

    /// Candidate blob from the peer we are negotiating with
    IceCandidate(Value),
}

impl ServerMessage {
    pub fn encode(&self) -> Result<OutboundMessage, SignalingError> {
        Ok(OutboundMessage::from(serde_json::to_string(self)?))
    }
}

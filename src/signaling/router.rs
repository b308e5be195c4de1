use serde_json::Value;
use tracing::{debug, info};

use super::messages::{ClientMessage, ServerMessage};
use super::registry::Registry;
use super::types::{Connection, ConnectionId, OutboundMessage, SignalingError};

/// Routes inbound signaling messages to their recipients.
#[derive(Debug, Clone)]
pub struct Router {
    registry: Registry,
}

impl Router {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Deliver `msg` from `sender` and return how many connections received it.
    ///
    /// Missing targets and closed channels are not errors here; the only
    /// failure is a message that cannot be encoded.
    pub async fn route(
        &self,
        sender: ConnectionId,
        msg: ClientMessage,
    ) -> Result<usize, SignalingError> {
        match msg {
            ClientMessage::Join => {
                let delivered = self.broadcast(sender, ServerMessage::UserJoined(sender)).await?;
                info!("Connection {} joined, announced to {} peers", sender, delivered);
                Ok(delivered)
            }

            ClientMessage::Offer { offer } => {
                self.broadcast(sender, ServerMessage::Offer(offer)).await
            }

            ClientMessage::Answer { target, mut payload } => {
                payload.insert("id".to_string(), Value::String(sender.to_string()));
                self.forward(sender, target, ServerMessage::Answer(payload)).await
            }

            ClientMessage::IceCandidate { target, candidate } => {
                self.forward(sender, target, ServerMessage::IceCandidate(candidate))
                    .await
            }
        }
    }

    async fn broadcast(
        &self,
        sender: ConnectionId,
        msg: ServerMessage,
    ) -> Result<usize, SignalingError> {
        let out = msg.encode()?;
        let peers = self.registry.all_except(&sender).await;

        let mut delivered = 0;
        for peer in &peers {
            if self.deliver(peer, out.clone()).await {
                delivered += 1;
            }
        }
        Ok(delivered)
    }

    /// Send to exactly one peer. A sender can never target itself.
    async fn forward(
        &self,
        sender: ConnectionId,
        target: ConnectionId,
        msg: ServerMessage,
    ) -> Result<usize, SignalingError> {
        if target == sender {
            debug!("Dropping message from {} addressed to itself", sender);
            return Ok(0);
        }

        let Some(peer) = self.registry.lookup(&target).await else {
            debug!("Dropping message: {}", SignalingError::UnknownTarget(target));
            return Ok(0);
        };

        let out = msg.encode()?;
        Ok(usize::from(self.deliver(&peer, out).await))
    }

    /// Fire-and-forget send. A closed channel means the peer is gone, so it is
    /// removed from the registry.
    async fn deliver(&self, peer: &Connection, out: OutboundMessage) -> bool {
        match peer.send(out) {
            Ok(()) => true,
            Err(e) => {
                debug!("Dropping message: {}", e);
                self.registry.unregister(&peer.id()).await;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, json};
    use tokio::sync::mpsc;

    use super::*;

    struct Peer {
        id: ConnectionId,
        rx: mpsc::UnboundedReceiver<OutboundMessage>,
    }

    impl Peer {
        fn next(&mut self) -> Option<ServerMessage> {
            self.rx
                .try_recv()
                .ok()
                .map(|out| serde_json::from_str(out.as_str()).unwrap())
        }
    }

    async fn peer(registry: &Registry, id: &str) -> Peer {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ConnectionId::parse(id).unwrap();
        registry.register(Connection::new(id, tx)).await;
        Peer { id, rx }
    }

    fn answer(target: &str, sdp: &str) -> ClientMessage {
        let mut payload = Map::new();
        payload.insert("sdp".to_string(), json!(sdp));
        ClientMessage::Answer {
            target: ConnectionId::parse(target).unwrap(),
            payload,
        }
    }

    #[tokio::test]
    async fn join_announces_sender_to_everyone_else() {
        let registry = Registry::new();
        let router = Router::new(registry.clone());
        let mut a = peer(&registry, "A").await;
        let mut b = peer(&registry, "B").await;
        let mut c = peer(&registry, "C").await;

        let delivered = router.route(a.id, ClientMessage::Join).await.unwrap();

        assert_eq!(delivered, 2);
        assert_eq!(b.next(), Some(ServerMessage::UserJoined(a.id)));
        assert_eq!(c.next(), Some(ServerMessage::UserJoined(a.id)));
        assert_eq!(b.next(), None);
        assert_eq!(c.next(), None);
        assert_eq!(a.next(), None);
    }

    #[tokio::test]
    async fn answer_reaches_only_its_target_once() {
        let registry = Registry::new();
        let router = Router::new(registry.clone());
        let mut a = peer(&registry, "A").await;
        let mut b = peer(&registry, "B").await;
        let mut c = peer(&registry, "C").await;

        let delivered = router.route(a.id, answer("B", "P")).await.unwrap();

        assert_eq!(delivered, 1);
        let Some(ServerMessage::Answer(body)) = b.next() else {
            panic!("Expected Answer");
        };
        assert_eq!(Value::Object(body), json!({"id": "A", "sdp": "P"}));
        assert_eq!(b.next(), None);
        assert_eq!(a.next(), None);
        assert_eq!(c.next(), None);
    }

    #[tokio::test]
    async fn answer_to_unknown_target_is_dropped_silently() {
        let registry = Registry::new();
        let router = Router::new(registry.clone());
        let mut a = peer(&registry, "A").await;
        let mut b = peer(&registry, "B").await;

        let delivered = router.route(a.id, answer("X", "P")).await.unwrap();

        assert_eq!(delivered, 0);
        assert_eq!(a.next(), None);
        assert_eq!(b.next(), None);
    }

    #[tokio::test]
    async fn ice_candidate_forwards_only_the_candidate() {
        let registry = Registry::new();
        let router = Router::new(registry.clone());
        let a = peer(&registry, "A").await;
        let mut b = peer(&registry, "B").await;

        let msg = ClientMessage::IceCandidate {
            target: b.id,
            candidate: json!({"candidate": "candidate:0 1 UDP", "sdpMLineIndex": 0}),
        };
        assert_eq!(router.route(a.id, msg).await.unwrap(), 1);
        assert_eq!(
            b.next(),
            Some(ServerMessage::IceCandidate(
                json!({"candidate": "candidate:0 1 UDP", "sdpMLineIndex": 0})
            ))
        );
    }

    #[tokio::test]
    async fn messages_addressed_to_sender_are_dropped() {
        let registry = Registry::new();
        let router = Router::new(registry.clone());
        let mut a = peer(&registry, "A").await;
        let mut b = peer(&registry, "B").await;

        assert_eq!(router.route(a.id, answer("A", "P")).await.unwrap(), 0);
        let msg = ClientMessage::IceCandidate {
            target: a.id,
            candidate: json!("candidate:1"),
        };
        assert_eq!(router.route(a.id, msg).await.unwrap(), 0);

        assert_eq!(a.next(), None);
        assert_eq!(b.next(), None);
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn offer_then_answer_scenario() {
        let registry = Registry::new();
        let router = Router::new(registry.clone());
        let mut c1 = peer(&registry, "c1").await;
        let mut c2 = peer(&registry, "c2").await;

        let offer = ClientMessage::Offer {
            offer: json!("sdp1"),
        };
        assert_eq!(router.route(c1.id, offer).await.unwrap(), 1);
        assert_eq!(c2.next(), Some(ServerMessage::Offer(json!("sdp1"))));
        assert_eq!(c1.next(), None);

        assert_eq!(router.route(c2.id, answer("c1", "sdp2")).await.unwrap(), 1);
        let Some(ServerMessage::Answer(body)) = c1.next() else {
            panic!("Expected Answer");
        };
        assert_eq!(Value::Object(body), json!({"id": "c2", "sdp": "sdp2"}));
        assert_eq!(c2.next(), None);
    }

    #[tokio::test]
    async fn messages_to_one_target_keep_send_order() {
        let registry = Registry::new();
        let router = Router::new(registry.clone());
        let a = peer(&registry, "A").await;
        let mut b = peer(&registry, "B").await;

        router.route(a.id, answer("B", "first")).await.unwrap();
        for n in 0..3 {
            let msg = ClientMessage::IceCandidate {
                target: b.id,
                candidate: json!(n),
            };
            router.route(a.id, msg).await.unwrap();
        }

        assert!(matches!(b.next(), Some(ServerMessage::Answer(_))));
        for n in 0..3 {
            assert_eq!(b.next(), Some(ServerMessage::IceCandidate(json!(n))));
        }
    }

    #[tokio::test]
    async fn closed_channel_unregisters_target() {
        let registry = Registry::new();
        let router = Router::new(registry.clone());
        let a = peer(&registry, "A").await;
        let b = peer(&registry, "B").await;
        let mut c = peer(&registry, "C").await;
        let b_id = b.id;
        drop(b);

        let delivered = router
            .route(a.id, ClientMessage::Offer { offer: json!("sdp") })
            .await
            .unwrap();

        assert_eq!(delivered, 1);
        assert_eq!(c.next(), Some(ServerMessage::Offer(json!("sdp"))));
        assert!(registry.lookup(&b_id).await.is_none());
        assert_eq!(registry.len().await, 2);
    }
}

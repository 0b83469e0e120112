use std::sync::Arc;
use tokio::sync::mpsc;

use roomcast::room::InMemoryRoomStore;
use roomcast::router::MessageRouter;
use roomcast::shared::RelayError;
use roomcast::signaling::{SignalKind, SignalingRelay};
use roomcast::websockets::{ConnectionRegistry, MessageType, WebSocketMessage};

use super::mocks::MockConnectionRegistry;

/// Wires the in-memory store and a recording registry to a router and
/// relay, with helpers that drive them the way the WebSocket layer would.
pub struct TestSetup {
    pub store: Arc<InMemoryRoomStore>,
    pub registry: Arc<MockConnectionRegistry>,
    pub router: Arc<MessageRouter>,
    pub relay: Arc<SignalingRelay>,
}

impl TestSetup {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryRoomStore::new());
        let registry = Arc::new(MockConnectionRegistry::new());
        let router = Arc::new(MessageRouter::new(store.clone(), registry.clone()));
        let relay = Arc::new(SignalingRelay::new(store.clone(), registry.clone()));
        Self {
            store,
            registry,
            router,
            relay,
        }
    }

    /// Register a transport connection without joining any room
    pub async fn connect(&self, connection_id: &str) {
        let (tx, _rx) = mpsc::unbounded_channel();
        self.registry
            .add_connection(connection_id.to_string(), tx)
            .await;
    }

    pub async fn join(
        &self,
        connection_id: &str,
        username: &str,
        room_id: &str,
    ) -> Result<(), RelayError> {
        self.router
            .handle_join(connection_id, username, room_id)
            .await
    }

    pub async fn send(
        &self,
        connection_id: &str,
        room_id: &str,
        text: &str,
    ) -> Result<(), RelayError> {
        self.router
            .handle_send(connection_id, room_id, text, None)
            .await
    }

    /// Full disconnect sequence as the transport layer performs it:
    /// room purge with departure fan-out, then registry removal
    pub async fn disconnect(&self, connection_id: &str) {
        self.router.handle_disconnect(connection_id).await;
        self.registry.remove_connection(connection_id).await;
    }

    pub async fn signal(
        &self,
        kind: SignalKind,
        sender: &str,
        target: &str,
        payload: serde_json::Value,
    ) {
        self.relay.relay(kind, sender, target, payload).await;
    }

    /// Parsed messages delivered to one connection
    pub async fn messages_for(&self, connection_id: &str) -> Vec<WebSocketMessage> {
        self.registry
            .get_messages_for(connection_id)
            .await
            .iter()
            .map(|raw| serde_json::from_str(raw).expect("delivered message should parse"))
            .collect()
    }

    /// Messages of one type delivered to one connection
    pub async fn messages_of_type(
        &self,
        connection_id: &str,
        message_type: MessageType,
    ) -> Vec<WebSocketMessage> {
        self.messages_for(connection_id)
            .await
            .into_iter()
            .filter(|m| m.message_type == message_type)
            .collect()
    }
}

impl Default for TestSetup {
    fn default() -> Self {
        Self::new()
    }
}

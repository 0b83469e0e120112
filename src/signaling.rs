use std::sync::Arc;
use tracing::{debug, instrument};

use crate::room::RoomStore;
use crate::websockets::{ConnectionRegistry, WebSocketMessage};

/// Marker relayed when the sender isn't currently joined anywhere and no
/// display name can be resolved.
const UNKNOWN_SENDER: &str = "Someone";

/// The three negotiation payload kinds the relay forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    Candidate,
}

/// Stateless pass-through for peer-connection negotiation payloads between
/// two specific connections. The payload is never parsed, validated, or
/// mutated; the server is only the rendezvous point.
///
/// Relaying is fire-and-forget: a target that is gone from the registry is a
/// silent no-op, never an error back to the sender.
pub struct SignalingRelay {
    store: Arc<dyn RoomStore + Send + Sync>,
    connections: Arc<dyn ConnectionRegistry>,
}

impl SignalingRelay {
    pub fn new(
        store: Arc<dyn RoomStore + Send + Sync>,
        connections: Arc<dyn ConnectionRegistry>,
    ) -> Self {
        Self { store, connections }
    }

    #[instrument(skip(self, payload))]
    pub async fn relay(
        &self,
        kind: SignalKind,
        sender_connection_id: &str,
        target_connection_id: &str,
        payload: serde_json::Value,
    ) {
        // Best-effort sender identity from whatever room the sender occupies
        let sender_username = self
            .store
            .username_of(sender_connection_id)
            .await
            .unwrap_or_else(|| UNKNOWN_SENDER.to_string());

        let message = match kind {
            SignalKind::Offer => WebSocketMessage::webrtc_offer(
                payload,
                sender_connection_id.to_string(),
                sender_username,
            ),
            SignalKind::Answer => WebSocketMessage::webrtc_answer(
                payload,
                sender_connection_id.to_string(),
                sender_username,
            ),
            SignalKind::Candidate => WebSocketMessage::ice_candidate(
                payload,
                sender_connection_id.to_string(),
                sender_username,
            ),
        };

        debug!(
            kind = ?kind,
            sender = %sender_connection_id,
            target = %target_connection_id,
            "Relaying signaling payload"
        );

        // Unknown target means the peer is gone or mid-disconnect; the
        // registry drops the send silently
        self.connections
            .send_to_connection(target_connection_id, &message.to_json())
            .await;
    }
}

use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::room::{Attachment, RoomStore};
use crate::shared::RelayError;
use crate::websockets::{ConnectionRegistry, WebSocketMessage};

/// Processes join, send, and disconnect events against the room store and
/// pushes the resulting fan-out through the connection registry.
///
/// Each handler returns the synchronous result for the caller's ack; the
/// broadcasts to other members go out on their own queues and never block on
/// or report back to the caller.
pub struct MessageRouter {
    store: Arc<dyn RoomStore + Send + Sync>,
    connections: Arc<dyn ConnectionRegistry>,
}

impl MessageRouter {
    pub fn new(
        store: Arc<dyn RoomStore + Send + Sync>,
        connections: Arc<dyn ConnectionRegistry>,
    ) -> Self {
        Self { store, connections }
    }

    /// Join a room. On success the joiner gets a private JOIN_CONFIRMATION
    /// with the member list and recent history, and every other member gets
    /// a USER_JOINED notice. A connection already in a room is moved: the
    /// old room's remainder gets a USER_LEFT first.
    #[instrument(skip(self))]
    pub async fn handle_join(
        &self,
        connection_id: &str,
        username: &str,
        room_id: &str,
    ) -> Result<(), RelayError> {
        let joined = self
            .store
            .add_member(room_id, connection_id, username)
            .await?;

        // Departure notice for the implicitly-left room, if any remainder
        // is there to hear it
        if let Some(departed) = &joined.departed {
            if !departed.remaining_connections.is_empty() {
                let notice = WebSocketMessage::user_left(
                    &departed.username,
                    departed.remaining_members.clone(),
                )
                .to_json();
                self.connections
                    .send_to_connections(&departed.remaining_connections, &notice)
                    .await;
            }
        }

        // Private confirmation to the joiner
        let confirmation = WebSocketMessage::join_confirmation(
            joined.username.clone(),
            room_id.to_string(),
            joined.members.clone(),
            joined.recent.clone(),
        )
        .to_json();
        self.connections
            .send_to_connection(connection_id, &confirmation)
            .await;

        // Presence notice to everyone else in the room
        let others: Vec<String> = joined
            .member_connections
            .iter()
            .filter(|c| c.as_str() != connection_id)
            .cloned()
            .collect();
        if !others.is_empty() {
            let notice =
                WebSocketMessage::user_joined(&joined.username, joined.members.clone()).to_json();
            self.connections.send_to_connections(&others, &notice).await;
        }

        info!(
            room_id = %room_id,
            connection_id = %connection_id,
            username = %joined.username,
            "Join processed"
        );

        Ok(())
    }

    /// Send a chat message to a room. The stored message is echoed to all
    /// members including the sender, so every client renders from the same
    /// authoritative copy.
    #[instrument(skip(self, text, file))]
    pub async fn handle_send(
        &self,
        connection_id: &str,
        room_id: &str,
        text: &str,
        file: Option<Attachment>,
    ) -> Result<(), RelayError> {
        let appended = self
            .store
            .append_message(room_id, connection_id, text, file)
            .await?;

        // Fan-out targets come from the append's own atomic snapshot: a
        // connection joining afterwards gets the message in its history
        // replay instead, never both
        let broadcast = WebSocketMessage::new_message(&appended.message).to_json();
        self.connections
            .send_to_connections(&appended.member_connections, &broadcast)
            .await;

        debug!(
            room_id = %room_id,
            message_id = %appended.message.id,
            recipients = appended.member_connections.len(),
            "Message broadcast"
        );

        Ok(())
    }

    /// Remove a disconnected connection from its room, notifying whoever
    /// remains. No-op for connections that never joined a room; an emptied
    /// room is gone already and nobody is left to notify.
    #[instrument(skip(self))]
    pub async fn handle_disconnect(&self, connection_id: &str) {
        let Some(removed) = self.store.remove_member(connection_id).await else {
            debug!(connection_id = %connection_id, "Disconnect for unjoined connection");
            return;
        };

        if !removed.remaining_connections.is_empty() {
            let notice =
                WebSocketMessage::user_left(&removed.username, removed.remaining_members.clone())
                    .to_json();
            self.connections
                .send_to_connections(&removed.remaining_connections, &notice)
                .await;
        }

        info!(
            room_id = %removed.room_id,
            connection_id = %connection_id,
            username = %removed.username,
            remaining = removed.remaining_members.len(),
            "Disconnect processed"
        );
    }
}

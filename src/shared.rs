use std::sync::Arc;
use thiserror::Error;

use crate::room::store::RoomStore;
use crate::router::MessageRouter;
use crate::signaling::SignalingRelay;
use crate::websockets::ConnectionRegistry;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub room_store: Arc<dyn RoomStore + Send + Sync>,
    pub connections: Arc<dyn ConnectionRegistry>,
    pub router: Arc<MessageRouter>,
    pub relay: Arc<SignalingRelay>,
}

impl AppState {
    pub fn new(
        room_store: Arc<dyn RoomStore + Send + Sync>,
        connections: Arc<dyn ConnectionRegistry>,
    ) -> Self {
        let router = Arc::new(MessageRouter::new(room_store.clone(), connections.clone()));
        let relay = Arc::new(SignalingRelay::new(room_store.clone(), connections.clone()));
        Self {
            room_store,
            connections,
            router,
            relay,
        }
    }
}

/// Caller-input validation failures. Every variant is reported back to the
/// offending connection as an error acknowledgment; none of them mutate room
/// state or count as a server fault. The messages are the client-facing
/// strings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelayError {
    #[error("Username must be 2-20 characters")]
    InvalidUsername,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Not in room")]
    NotInRoom,

    #[error("Message cannot be empty")]
    EmptyMessage,
}

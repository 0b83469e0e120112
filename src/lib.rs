// Library crate for the roomcast relay server
// This file exposes the public API for integration tests

pub mod room;
pub mod router;
pub mod shared;
pub mod signaling;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use room::{Attachment, ChatMessage, InMemoryRoomStore, RoomStore, HISTORY_REPLAY_LIMIT};
pub use router::MessageRouter;
pub use shared::{AppState, RelayError};
pub use signaling::{SignalKind, SignalingRelay};
pub use websockets::{
    ConnectionRegistry, InMemoryConnectionRegistry, MessageHandler, MessageType, WebSocketMessage,
    DEFAULT_ROOM,
};

// Public API
pub use connection_manager::{ConnectionRegistry, InMemoryConnectionRegistry};
pub use handler::{websocket_handler, RelayReceiveHandler, DEFAULT_ROOM};
pub use messages::{MessageType, WebSocketMessage};
pub use socket::{Connection, MessageHandler, SocketError, SocketWrapper};

// Internal modules
mod connection_manager;
mod handler;
pub mod messages;
mod socket;

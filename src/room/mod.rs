// Public API - what other modules can use
pub use models::{Attachment, ChatMessage, Room, RoomMember};
pub use store::{
    InMemoryRoomStore, MemberRemoved, MessageAppended, RoomJoined, RoomStore, HISTORY_REPLAY_LIMIT,
};

// Internal modules
pub mod models;
pub mod store;

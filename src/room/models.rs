use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Descriptor for a file stored by the external upload side-channel.
/// The relay never interprets these fields; they are carried verbatim
/// inside chat messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    pub url: String,
}

/// A single chat message as stored in room history and broadcast to members.
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub username: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub file: Option<Attachment>,
}

impl ChatMessage {
    /// Creates a new message with a fresh id and the current timestamp
    pub fn new(username: String, message: String, file: Option<Attachment>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            message,
            timestamp: Utc::now(),
            file,
        }
    }
}

/// One member of a room: the live connection and the display name it joined
/// under.
#[derive(Debug, Clone)]
pub struct RoomMember {
    pub connection_id: String,
    pub username: String,
}

/// In-memory state of a single room. Members keep join-insertion order,
/// which is the order presence lists are shown to clients.
#[derive(Debug, Clone, Default)]
pub struct Room {
    pub members: Vec<RoomMember>,
    pub history: Vec<ChatMessage>,
}

impl Room {
    /// Display name of a member connection, if present
    pub fn username_of(&self, connection_id: &str) -> Option<&str> {
        self.members
            .iter()
            .find(|m| m.connection_id == connection_id)
            .map(|m| m.username.as_str())
    }

    /// Current usernames in join order
    pub fn usernames(&self) -> Vec<String> {
        self.members.iter().map(|m| m.username.clone()).collect()
    }

    /// Current member connection ids in join order
    pub fn connection_ids(&self) -> Vec<String> {
        self.members
            .iter()
            .map(|m| m.connection_id.clone())
            .collect()
    }
}

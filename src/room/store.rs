use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

use super::models::{Attachment, ChatMessage, Room, RoomMember};
use crate::shared::RelayError;

/// How many history messages are replayed to a newly joining client.
pub const HISTORY_REPLAY_LIMIT: usize = 50;

/// Result of successfully joining a room: the snapshot the joiner needs,
/// taken atomically with the membership change.
#[derive(Debug, Clone)]
pub struct RoomJoined {
    /// The username as registered (surrounding whitespace trimmed)
    pub username: String,
    /// Member usernames in join order, including the new member
    pub members: Vec<String>,
    /// Member connection ids in join order, including the new member
    pub member_connections: Vec<String>,
    /// Last messages in chronological order, at most HISTORY_REPLAY_LIMIT
    pub recent: Vec<ChatMessage>,
    /// Set when the connection was implicitly removed from a previous room
    /// as part of this join
    pub departed: Option<MemberRemoved>,
}

/// Result of removing a connection from its current room.
#[derive(Debug, Clone)]
pub struct MemberRemoved {
    pub room_id: String,
    pub username: String,
    /// Usernames still in the room; empty means the room was deleted
    pub remaining_members: Vec<String>,
    /// Connection ids still in the room, for departure fan-out
    pub remaining_connections: Vec<String>,
}

/// Result of appending a chat message: the stored message plus the fan-out
/// targets as of the same atomic step, so a concurrent join can't see the
/// message both in its history replay and as a broadcast.
#[derive(Debug, Clone)]
pub struct MessageAppended {
    pub message: ChatMessage,
    /// Member connection ids at append time, including the author
    pub member_connections: Vec<String>,
}

/// Trait for the authoritative room membership and history table
#[async_trait]
pub trait RoomStore {
    /// Atomically adds a connection to a room under the given username,
    /// creating the room if it does not exist. A connection belongs to at
    /// most one room, so any existing membership is removed in the same
    /// atomic step and reported back for departure fan-out. Fails without
    /// side effects if the trimmed username is invalid or already held by
    /// another member of that room.
    async fn add_member(
        &self,
        room_id: &str,
        connection_id: &str,
        username: &str,
    ) -> Result<RoomJoined, RelayError>;

    /// Atomically removes a connection from whatever room it occupies.
    /// Deletes the room (history included) if it becomes empty. Returns None
    /// if the connection was not in any room.
    async fn remove_member(&self, connection_id: &str) -> Option<MemberRemoved>;

    /// Validates and appends a chat message authored by `connection_id` to
    /// the named room's history. The membership check, the append, and the
    /// fan-out snapshot happen under the same lock, so a racing disconnect
    /// can never leave a message from a departed member.
    async fn append_message(
        &self,
        room_id: &str,
        connection_id: &str,
        text: &str,
        file: Option<Attachment>,
    ) -> Result<MessageAppended, RelayError>;

    /// Last `n` messages in chronological order; empty if the room is absent
    async fn recent_messages(&self, room_id: &str, n: usize) -> Vec<ChatMessage>;

    /// Current usernames in join order; empty if the room is absent
    async fn member_usernames(&self, room_id: &str) -> Vec<String>;

    /// Current member connection ids in join order; empty if the room is absent
    async fn member_connections(&self, room_id: &str) -> Vec<String>;

    /// Username the connection is currently joined under, if any
    async fn username_of(&self, connection_id: &str) -> Option<String>;

    /// Room the connection is currently joined to, if any
    async fn room_of(&self, connection_id: &str) -> Option<String>;
}

/// Rooms plus the reverse connection -> room index. Both live under one lock
/// so membership changes and index updates are a single atomic step.
#[derive(Default)]
struct StoreInner {
    rooms: HashMap<String, Room>,
    member_index: HashMap<String, String>,
}

impl StoreInner {
    /// Removes a connection from its current room, deleting the room if it
    /// empties. Caller holds the lock.
    fn remove_connection(&mut self, connection_id: &str) -> Option<MemberRemoved> {
        let room_id = self.member_index.remove(connection_id)?;
        let room = self.rooms.get_mut(&room_id)?;

        let username = room.username_of(connection_id)?.to_string();
        room.members.retain(|m| m.connection_id != connection_id);

        // Delete the room the instant it empties; history goes with it
        if room.members.is_empty() {
            self.rooms.remove(&room_id);
            info!(room_id = %room_id, username = %username, "Last member left, room deleted");
            return Some(MemberRemoved {
                room_id,
                username,
                remaining_members: Vec::new(),
                remaining_connections: Vec::new(),
            });
        }

        let remaining_members = room.usernames();
        let remaining_connections = room.connection_ids();

        info!(
            room_id = %room_id,
            username = %username,
            member_count = remaining_members.len(),
            "Member left room"
        );

        Some(MemberRemoved {
            room_id,
            username,
            remaining_members,
            remaining_connections,
        })
    }
}

/// In-memory implementation of RoomStore. The single mutex is the
/// serialization point for room mutations: room creation and deletion are
/// atomic with the membership change that triggers them, and a processed
/// disconnect is never visible to later operations.
pub struct InMemoryRoomStore {
    inner: Mutex<StoreInner>,
}

impl Default for InMemoryRoomStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomStore {
    /// Creates a new empty in-memory store
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
        }
    }
}

fn validate_username(username: &str) -> Result<&str, RelayError> {
    let trimmed = username.trim();
    // Length limits are in characters, not bytes
    let length = trimmed.chars().count();
    if !(2..=20).contains(&length) {
        return Err(RelayError::InvalidUsername);
    }
    Ok(trimmed)
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    #[instrument(skip(self))]
    async fn add_member(
        &self,
        room_id: &str,
        connection_id: &str,
        username: &str,
    ) -> Result<RoomJoined, RelayError> {
        let trimmed = validate_username(username)?;

        let mut inner = self.inner.lock().unwrap();

        // Duplicate detection is exact-match on the trimmed name,
        // case-sensitive, checked at join time only. The connection's own
        // current entry doesn't count: rejoining the same room under the
        // same name is a leave-then-join, not a collision.
        if let Some(room) = inner.rooms.get(room_id) {
            let taken = room
                .members
                .iter()
                .any(|m| m.username == trimmed && m.connection_id != connection_id);
            if taken {
                debug!(room_id = %room_id, username = %trimmed, "Username already taken in room");
                return Err(RelayError::UsernameTaken);
            }
        }

        // All checks passed; leave the previous room (if any) and join the
        // new one as one atomic step
        let departed = inner.remove_connection(connection_id);

        let room = inner.rooms.entry(room_id.to_string()).or_default();
        room.members.push(RoomMember {
            connection_id: connection_id.to_string(),
            username: trimmed.to_string(),
        });

        let members = room.usernames();
        let member_connections = room.connection_ids();
        let recent = room
            .history
            .iter()
            .rev()
            .take(HISTORY_REPLAY_LIMIT)
            .rev()
            .cloned()
            .collect();

        inner
            .member_index
            .insert(connection_id.to_string(), room_id.to_string());

        info!(
            room_id = %room_id,
            username = %trimmed,
            member_count = members.len(),
            "Member joined room"
        );

        Ok(RoomJoined {
            username: trimmed.to_string(),
            members,
            member_connections,
            recent,
            departed,
        })
    }

    #[instrument(skip(self))]
    async fn remove_member(&self, connection_id: &str) -> Option<MemberRemoved> {
        let mut inner = self.inner.lock().unwrap();
        inner.remove_connection(connection_id)
    }

    #[instrument(skip(self, text, file))]
    async fn append_message(
        &self,
        room_id: &str,
        connection_id: &str,
        text: &str,
        file: Option<Attachment>,
    ) -> Result<MessageAppended, RelayError> {
        let trimmed = text.trim();
        if trimmed.is_empty() && file.is_none() {
            return Err(RelayError::EmptyMessage);
        }

        let mut inner = self.inner.lock().unwrap();

        let room = inner.rooms.get_mut(room_id).ok_or(RelayError::NotInRoom)?;
        let username = room
            .username_of(connection_id)
            .ok_or(RelayError::NotInRoom)?
            .to_string();

        let message = ChatMessage::new(username, trimmed.to_string(), file);
        room.history.push(message.clone());
        let member_connections = room.connection_ids();

        debug!(
            room_id = %room_id,
            message_id = %message.id,
            author = %message.username,
            history_len = room.history.len(),
            "Message appended"
        );

        Ok(MessageAppended {
            message,
            member_connections,
        })
    }

    async fn recent_messages(&self, room_id: &str, n: usize) -> Vec<ChatMessage> {
        let inner = self.inner.lock().unwrap();
        match inner.rooms.get(room_id) {
            Some(room) => room.history.iter().rev().take(n).rev().cloned().collect(),
            None => Vec::new(),
        }
    }

    async fn member_usernames(&self, room_id: &str) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .rooms
            .get(room_id)
            .map(|room| room.usernames())
            .unwrap_or_default()
    }

    async fn member_connections(&self, room_id: &str) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .rooms
            .get(room_id)
            .map(|room| room.connection_ids())
            .unwrap_or_default()
    }

    async fn username_of(&self, connection_id: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        let room_id = inner.member_index.get(connection_id)?;
        inner
            .rooms
            .get(room_id)
            .and_then(|room| room.username_of(connection_id))
            .map(str::to_string)
    }

    async fn room_of(&self, connection_id: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.member_index.get(connection_id).cloned()
    }
}

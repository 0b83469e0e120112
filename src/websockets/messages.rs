use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::room::{Attachment, ChatMessage};

/// Message types for WebSocket communication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    // Client -> Server
    Join,
    SendMessage,

    // Server -> Client
    Ack,
    JoinConfirmation,
    UserJoined,
    UserLeft,
    NewMessage,

    // Both directions (signaling pass-through)
    WebrtcOffer,
    WebrtcAnswer,
    IceCandidate,
}

/// Metadata for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessageMeta {
    pub timestamp: DateTime<Utc>,
}

/// Base structure for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub payload: serde_json::Value,
    pub meta: Option<WebSocketMessageMeta>,
}

/// Client-to-Server message payloads
#[derive(Debug, Clone, Deserialize)]
pub struct JoinPayload {
    pub username: String,
    pub room_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessagePayload {
    pub room_id: String,
    pub message: Option<String>,
    pub file: Option<Attachment>,
}

/// Inbound signaling payloads: the target plus one kind-specific opaque
/// field. The opaque part is never inspected, only forwarded.
#[derive(Debug, Clone, Deserialize)]
pub struct WebrtcOfferPayload {
    pub target_sid: String,
    pub offer: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebrtcAnswerPayload {
    pub target_sid: String,
    pub answer: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IceCandidatePayload {
    pub target_sid: String,
    pub candidate: serde_json::Value,
}

/// Server-to-Client message payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckPayload {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinConfirmationPayload {
    pub username: String,
    pub room_id: String,
    pub users: Vec<String>,
    pub messages: Vec<ChatMessage>,
}

/// Payload for presence notifications (USER_JOINED / USER_LEFT)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresencePayload {
    pub username: String,
    pub message: String,
    pub users: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebrtcOfferOut {
    pub offer: serde_json::Value,
    pub caller_sid: String,
    pub caller_username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebrtcAnswerOut {
    pub answer: serde_json::Value,
    pub sender_sid: String,
    pub sender_username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IceCandidateOut {
    pub candidate: serde_json::Value,
    pub sender_sid: String,
    pub sender_username: String,
}

/// Helper functions for creating messages
impl WebSocketMessage {
    pub fn new(message_type: MessageType, payload: serde_json::Value) -> Self {
        Self {
            message_type,
            payload,
            meta: Some(WebSocketMessageMeta {
                timestamp: Utc::now(),
            }),
        }
    }

    /// Create a success ACK message
    pub fn ack_success() -> Self {
        let payload = AckPayload {
            status: "success".to_string(),
            message: None,
        };
        Self::new(MessageType::Ack, serde_json::to_value(payload).unwrap())
    }

    /// Create an error ACK message
    pub fn ack_error(message: String) -> Self {
        let payload = AckPayload {
            status: "error".to_string(),
            message: Some(message),
        };
        Self::new(MessageType::Ack, serde_json::to_value(payload).unwrap())
    }

    /// Create a JOIN_CONFIRMATION message for the joining connection
    pub fn join_confirmation(
        username: String,
        room_id: String,
        users: Vec<String>,
        messages: Vec<ChatMessage>,
    ) -> Self {
        let payload = JoinConfirmationPayload {
            username,
            room_id,
            users,
            messages,
        };
        Self::new(
            MessageType::JoinConfirmation,
            serde_json::to_value(payload).unwrap(),
        )
    }

    /// Create a USER_JOINED broadcast with a system-authored notice
    pub fn user_joined(username: &str, users: Vec<String>) -> Self {
        let payload = PresencePayload {
            username: "System".to_string(),
            message: format!("{} has joined the room", username),
            users,
            timestamp: Utc::now(),
        };
        Self::new(
            MessageType::UserJoined,
            serde_json::to_value(payload).unwrap(),
        )
    }

    /// Create a USER_LEFT broadcast naming the departed member
    pub fn user_left(username: &str, users: Vec<String>) -> Self {
        let payload = PresencePayload {
            username: username.to_string(),
            message: format!("{} has left the room", username),
            users,
            timestamp: Utc::now(),
        };
        Self::new(
            MessageType::UserLeft,
            serde_json::to_value(payload).unwrap(),
        )
    }

    /// Create a NEW_MESSAGE broadcast carrying the stored message verbatim
    pub fn new_message(message: &ChatMessage) -> Self {
        Self::new(
            MessageType::NewMessage,
            serde_json::to_value(message).unwrap(),
        )
    }

    /// Create a WEBRTC_OFFER relay message
    pub fn webrtc_offer(
        offer: serde_json::Value,
        caller_sid: String,
        caller_username: String,
    ) -> Self {
        let payload = WebrtcOfferOut {
            offer,
            caller_sid,
            caller_username,
        };
        Self::new(
            MessageType::WebrtcOffer,
            serde_json::to_value(payload).unwrap(),
        )
    }

    /// Create a WEBRTC_ANSWER relay message
    pub fn webrtc_answer(
        answer: serde_json::Value,
        sender_sid: String,
        sender_username: String,
    ) -> Self {
        let payload = WebrtcAnswerOut {
            answer,
            sender_sid,
            sender_username,
        };
        Self::new(
            MessageType::WebrtcAnswer,
            serde_json::to_value(payload).unwrap(),
        )
    }

    /// Create an ICE_CANDIDATE relay message
    pub fn ice_candidate(
        candidate: serde_json::Value,
        sender_sid: String,
        sender_username: String,
    ) -> Self {
        let payload = IceCandidateOut {
            candidate,
            sender_sid,
            sender_username,
        };
        Self::new(
            MessageType::IceCandidate,
            serde_json::to_value(payload).unwrap(),
        )
    }

    /// Serialize for the wire
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

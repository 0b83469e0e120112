use async_trait::async_trait;
use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::shared::AppState;
use crate::signaling::{SignalKind, SignalingRelay};
use crate::websockets::messages::{
    IceCandidatePayload, JoinPayload, MessageType, SendMessagePayload, WebSocketMessage,
    WebrtcAnswerPayload, WebrtcOfferPayload,
};

use super::connection_manager::ConnectionRegistry;
use super::socket::{Connection, MessageHandler};

/// Room id used when a join request names none.
pub const DEFAULT_ROOM: &str = "lobby";

/// Message handler for receiving WebSocket messages from a client
/// connection. Join and send results go back to the caller as an ACK;
/// signaling events are forwarded with no acknowledgment.
pub struct RelayReceiveHandler {
    router: Arc<crate::router::MessageRouter>,
    relay: Arc<SignalingRelay>,
    connections: Arc<dyn ConnectionRegistry>,
}

impl RelayReceiveHandler {
    pub fn new(
        router: Arc<crate::router::MessageRouter>,
        relay: Arc<SignalingRelay>,
        connections: Arc<dyn ConnectionRegistry>,
    ) -> Self {
        Self {
            router,
            relay,
            connections,
        }
    }

    async fn send_ack(&self, connection_id: &str, result: Result<(), crate::shared::RelayError>) {
        let ack = match result {
            Ok(()) => WebSocketMessage::ack_success(),
            Err(e) => WebSocketMessage::ack_error(e.to_string()),
        };
        self.connections
            .send_to_connection(connection_id, &ack.to_json())
            .await;
    }
}

#[async_trait]
impl MessageHandler for RelayReceiveHandler {
    async fn handle_message(&self, connection_id: &str, message: String) {
        debug!(
            connection_id = %connection_id,
            message = %message,
            "Received message"
        );

        let ws_message = match serde_json::from_str::<WebSocketMessage>(&message) {
            Ok(m) => m,
            Err(e) => {
                warn!(
                    connection_id = %connection_id,
                    error = %e,
                    "Failed to parse WebSocket message"
                );
                return;
            }
        };

        match ws_message.message_type {
            MessageType::Join => {
                match serde_json::from_value::<JoinPayload>(ws_message.payload) {
                    Ok(payload) => {
                        let room_id =
                            payload.room_id.unwrap_or_else(|| DEFAULT_ROOM.to_string());
                        let result = self
                            .router
                            .handle_join(connection_id, &payload.username, &room_id)
                            .await;
                        self.send_ack(connection_id, result).await;
                    }
                    Err(e) => {
                        warn!(connection_id = %connection_id, error = %e, "Invalid JOIN payload");
                    }
                }
            }
            MessageType::SendMessage => {
                match serde_json::from_value::<SendMessagePayload>(ws_message.payload) {
                    Ok(payload) => {
                        let text = payload.message.unwrap_or_default();
                        let result = self
                            .router
                            .handle_send(connection_id, &payload.room_id, &text, payload.file)
                            .await;
                        self.send_ack(connection_id, result).await;
                    }
                    Err(e) => {
                        warn!(
                            connection_id = %connection_id,
                            error = %e,
                            "Invalid SEND_MESSAGE payload"
                        );
                    }
                }
            }
            MessageType::WebrtcOffer => {
                match serde_json::from_value::<WebrtcOfferPayload>(ws_message.payload) {
                    Ok(payload) => {
                        self.relay
                            .relay(
                                SignalKind::Offer,
                                connection_id,
                                &payload.target_sid,
                                payload.offer,
                            )
                            .await;
                    }
                    Err(e) => {
                        warn!(
                            connection_id = %connection_id,
                            error = %e,
                            "Invalid WEBRTC_OFFER payload"
                        );
                    }
                }
            }
            MessageType::WebrtcAnswer => {
                match serde_json::from_value::<WebrtcAnswerPayload>(ws_message.payload) {
                    Ok(payload) => {
                        self.relay
                            .relay(
                                SignalKind::Answer,
                                connection_id,
                                &payload.target_sid,
                                payload.answer,
                            )
                            .await;
                    }
                    Err(e) => {
                        warn!(
                            connection_id = %connection_id,
                            error = %e,
                            "Invalid WEBRTC_ANSWER payload"
                        );
                    }
                }
            }
            MessageType::IceCandidate => {
                match serde_json::from_value::<IceCandidatePayload>(ws_message.payload) {
                    Ok(payload) => {
                        self.relay
                            .relay(
                                SignalKind::Candidate,
                                connection_id,
                                &payload.target_sid,
                                payload.candidate,
                            )
                            .await;
                    }
                    Err(e) => {
                        warn!(
                            connection_id = %connection_id,
                            error = %e,
                            "Invalid ICE_CANDIDATE payload"
                        );
                    }
                }
            }
            _ => {
                debug!(
                    message_type = ?ws_message.message_type,
                    "Unhandled message type"
                );
            }
        }
    }
}

/// WebSocket endpoint: GET /ws
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> Response {
    info!("WebSocket connection requested");
    ws.on_upgrade(move |socket| handle_websocket_connection(socket, app_state))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(socket: axum::extract::ws::WebSocket, app_state: AppState) {
    // Fresh opaque id per live transport session
    let connection_id = Uuid::new_v4().to_string();

    info!(
        connection_id = %connection_id,
        "WebSocket connection established"
    );

    // Create the outbound channel (app -> client)
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();

    // Register connection before any event can target it
    app_state
        .connections
        .add_connection(connection_id.clone(), outbound_sender)
        .await;

    // Wrap the axum WebSocket in our simple interface
    let socket_wrapper = Box::new(socket);

    let message_handler = Arc::new(RelayReceiveHandler::new(
        app_state.router.clone(),
        app_state.relay.clone(),
        app_state.connections.clone(),
    ));

    // Create and run the connection
    let connection = Connection::new(
        connection_id.clone(),
        socket_wrapper,
        outbound_receiver,
        message_handler,
    );

    // Run the connection until disconnect
    match connection.run().await {
        Ok(()) => {
            info!(
                connection_id = %connection_id,
                "WebSocket connection closed cleanly"
            );
        }
        Err(e) => {
            warn!(
                connection_id = %connection_id,
                error = ?e,
                "WebSocket connection error"
            );
        }
    }

    // Reap exactly once: purge room membership (with departure fan-out),
    // then drop the registry entry so later relays to this id are no-ops
    app_state.router.handle_disconnect(&connection_id).await;
    app_state
        .connections
        .remove_connection(&connection_id)
        .await;

    info!(
        connection_id = %connection_id,
        "WebSocket connection reaped"
    );
}

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use roomcast::websockets::ConnectionRegistry;

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Registry double that records every delivered message per connection.
/// Like the real registry, it delivers only to currently-registered
/// connections; sends to unknown ids vanish.
#[derive(Clone)]
pub struct MockConnectionRegistry {
    sent_messages: Arc<RwLock<HashMap<String, Vec<String>>>>,
    connected: Arc<RwLock<Vec<String>>>,
}

impl MockConnectionRegistry {
    pub fn new() -> Self {
        Self {
            sent_messages: Arc::new(RwLock::new(HashMap::new())),
            connected: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn add_connected(&self, connection_id: &str) {
        self.connected.write().await.push(connection_id.to_string());
    }

    pub async fn get_messages_for(&self, connection_id: &str) -> Vec<String> {
        self.sent_messages
            .read()
            .await
            .get(connection_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Total messages delivered anywhere, for no-delivery assertions
    pub async fn total_delivered(&self) -> usize {
        self.sent_messages
            .read()
            .await
            .values()
            .map(|v| v.len())
            .sum()
    }

    pub async fn clear_messages(&self) {
        self.sent_messages.write().await.clear();
    }
}

#[async_trait]
impl ConnectionRegistry for MockConnectionRegistry {
    async fn add_connection(&self, connection_id: String, _sender: mpsc::UnboundedSender<String>) {
        self.add_connected(&connection_id).await;
    }

    async fn remove_connection(&self, connection_id: &str) {
        self.connected
            .write()
            .await
            .retain(|c| c != connection_id);
    }

    async fn send_to_connection(&self, connection_id: &str, message: &str) {
        if !self
            .connected
            .read()
            .await
            .iter()
            .any(|c| c == connection_id)
        {
            return;
        }
        self.sent_messages
            .write()
            .await
            .entry(connection_id.to_string())
            .or_default()
            .push(message.to_string());
    }

    async fn send_to_connections(&self, connection_ids: &[String], message: &str) {
        for connection_id in connection_ids {
            self.send_to_connection(connection_id, message).await;
        }
    }
}

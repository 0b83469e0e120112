mod room;
mod router;
mod shared;
mod signaling;
mod websockets;

use axum::{routing::get, Router};
use room::InMemoryRoomStore;
use shared::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use websockets::InMemoryConnectionRegistry;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roomcast=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting roomcast relay server");

    // All state is in-memory and resets on restart
    let room_store = Arc::new(InMemoryRoomStore::new());
    let connections = Arc::new(InMemoryConnectionRegistry::new());
    let app_state = AppState::new(room_store, connections);

    // Clients are browsers served from elsewhere, so allow any origin
    let app = Router::new()
        .route("/ws", get(websockets::websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000);
    let addr = format!("0.0.0.0:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    info!("Server running on http://{addr}");
    axum::serve(listener, app).await.unwrap();
}

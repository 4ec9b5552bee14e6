use crate::config::ServerConfig;
use crate::room::{RoomHub, RoomHubHandle};
use crate::signaling::{SignalingService, ws_handler};
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Starts the room hub and wires it to a fresh connection table.
pub fn start_hub(config: &ServerConfig) -> SignalingService {
    let (hub, command_rx) = RoomHubHandle::channel(config.command_buffer);
    let signaling = SignalingService::new(hub, config.ice_servers.clone());

    let room_hub = RoomHub::new(command_rx, Arc::new(signaling.clone()));
    tokio::spawn(room_hub.run());

    signaling
}

pub fn router(signaling: SignalingService) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(|| async { "Clipboard Share Backend Running" }))
        .with_state(signaling)
}

/// Serves on an already bound listener until the task is dropped.
pub async fn serve_on(listener: TcpListener, config: &ServerConfig) -> Result<()> {
    let signaling = start_hub(config);
    let app = router(signaling);

    info!(
        "Signaling server listening on ws://{}/ws",
        listener.local_addr().context("listener has no local address")?
    );
    axum::serve(listener, app)
        .await
        .context("signaling server stopped")
}

pub async fn serve(config: ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;
    serve_on(listener, &config).await
}

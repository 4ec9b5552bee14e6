use crate::room::HubCommand;
use crate::signaling::SignalingService;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use clipshare_core::{ClientMessage, ErrorReason, PeerId, ServerMessage};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, PeerId::new(), service))
}

async fn handle_socket(socket: WebSocket, peer_id: PeerId, service: SignalingService) {
    info!("Client connected: {}", peer_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.add_peer(peer_id, tx);
    service.send_signal(
        peer_id,
        &ServerMessage::Welcome {
            peer_id,
            ice_servers: service.get_ice_servers(),
        },
    );

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(message) => {
                            let cmd = HubCommand::from_client(peer_id, message);
                            if let Err(e) = service.hub.send(cmd).await {
                                error!("Room hub died: {}", e);
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("Invalid ClientMessage from {}: {}", peer_id, e);
                            service.send_signal(
                                peer_id,
                                &ServerMessage::Error {
                                    reason: ErrorReason::Malformed,
                                },
                            );
                        }
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    if let Err(e) = service.hub.send(HubCommand::Disconnect { peer_id }).await {
        error!("Could not report disconnect of {}: {}", peer_id, e);
    }
    service.remove_peer(&peer_id);
    info!("WebSocket disconnected: {}", peer_id);
}

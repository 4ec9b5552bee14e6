use async_trait::async_trait;
use clipshare_core::{ClientMessage, PeerId, ServerMessage};
use clipshare_server::{HubCommand, RoomHub, RoomHubHandle, SignalingOutput};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

const PEER_QUEUE: usize = 256;

/// Per-peer outbound queues, standing in for WebSocket connections.
#[derive(Default)]
struct BrokerOutput {
    peers: Mutex<HashMap<PeerId, mpsc::Sender<ServerMessage>>>,
}

#[async_trait]
impl SignalingOutput for BrokerOutput {
    async fn deliver(&self, peer_id: PeerId, message: ServerMessage) -> bool {
        let sender = self.peers.lock().unwrap().get(&peer_id).cloned();
        match sender {
            Some(tx) => tx.send(message).await.is_ok(),
            None => false,
        }
    }
}

/// The real room hub, reachable over channels instead of sockets.
pub struct MemoryBroker {
    hub: RoomHubHandle,
    output: Arc<BrokerOutput>,
}

impl MemoryBroker {
    pub fn start() -> Self {
        let output = Arc::new(BrokerOutput::default());
        let hub = RoomHub::spawn(output.clone(), PEER_QUEUE);
        Self { hub, output }
    }

    /// Registers `peer_id`, queues its welcome and returns the two ends a
    /// session controller needs. Dropping the client sender disconnects.
    pub fn connect(
        &self,
        peer_id: PeerId,
    ) -> (mpsc::Receiver<ServerMessage>, mpsc::Sender<ClientMessage>) {
        let (server_tx, server_rx) = mpsc::channel(PEER_QUEUE);
        let (client_tx, mut client_rx) = mpsc::channel::<ClientMessage>(PEER_QUEUE);

        let welcome = ServerMessage::Welcome {
            peer_id,
            ice_servers: Vec::new(),
        };
        server_tx.try_send(welcome).unwrap();
        self.output.peers.lock().unwrap().insert(peer_id, server_tx);

        let hub = self.hub.clone();
        let output = self.output.clone();
        tokio::spawn(async move {
            while let Some(msg) = client_rx.recv().await {
                if hub.send(HubCommand::from_client(peer_id, msg)).await.is_err() {
                    break;
                }
            }
            output.peers.lock().unwrap().remove(&peer_id);
            let _ = hub.send(HubCommand::Disconnect { peer_id }).await;
        });

        (server_rx, client_tx)
    }
}

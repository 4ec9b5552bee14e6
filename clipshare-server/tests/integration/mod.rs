mod ws_tests;

use crate::utils::{Delivered, MockSignalingOutput};
use clipshare_core::{PeerId, RequestId, RoomId};
use clipshare_server::{HubCommand, RoomHub, RoomHubHandle, ServerConfig, serve_on};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A hub wired to a capturing output.
pub struct TestHub {
    pub hub: RoomHubHandle,
    pub output: MockSignalingOutput,
    pub rx: mpsc::UnboundedReceiver<Delivered>,
}

pub fn start_test_hub() -> TestHub {
    let (output, rx) = MockSignalingOutput::new();
    let hub = RoomHub::spawn(Arc::new(output.clone()), 64);
    TestHub { hub, output, rx }
}

impl TestHub {
    pub async fn create(&self, peer_id: PeerId, room: &str) -> RequestId {
        let req = RequestId::new();
        self.hub
            .send(HubCommand::CreateRoom {
                peer_id,
                req,
                room_id: RoomId::from(room),
            })
            .await
            .unwrap();
        req
    }

    pub async fn join(&self, peer_id: PeerId, room: &str) -> RequestId {
        let req = RequestId::new();
        self.hub
            .send(HubCommand::JoinRequest {
                peer_id,
                req,
                room_id: RoomId::from(room),
            })
            .await
            .unwrap();
        req
    }

    pub async fn decide(&self, host: PeerId, room: &str, requester: PeerId, approved: bool) {
        self.hub
            .send(HubCommand::HostResponse {
                peer_id: host,
                room_id: RoomId::from(room),
                requester_id: requester,
                approved,
            })
            .await
            .unwrap();
    }

    pub async fn disconnect(&self, peer_id: PeerId) {
        self.hub
            .send(HubCommand::Disconnect { peer_id })
            .await
            .unwrap();
    }
}

/// Binds an ephemeral port and serves the full router on it.
pub async fn start_test_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = ServerConfig::default();

    tokio::spawn(async move {
        if let Err(e) = serve_on(listener, &config).await {
            tracing::error!("test server stopped: {:#}", e);
        }
    });

    addr
}

use anyhow::{Context, Result, bail};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use clipshare_core::{
    ClientMessage, IceServerConfig, PeerId, Reply, RequestId, RoomId, ServerMessage,
};

use super::signal_helpers::{QUIET_PERIOD_MS, SIGNAL_TIMEOUT_MS};

/// Test client speaking the signaling protocol over a real WebSocket.
pub struct TestClient {
    pub peer_id: PeerId,
    pub ice_servers: Vec<IceServerConfig>,
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Connects to `ws://{addr}/ws` and consumes the welcome.
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let (socket, _) = connect_async(format!("ws://{}/ws", addr))
            .await
            .context("WebSocket connect failed")?;

        let mut client = Self {
            peer_id: PeerId::default(),
            ice_servers: Vec::new(),
            socket,
        };

        match client.recv().await? {
            ServerMessage::Welcome {
                peer_id,
                ice_servers,
            } => {
                tracing::debug!("[TestClient] welcomed as {}", peer_id);
                client.peer_id = peer_id;
                client.ice_servers = ice_servers;
                Ok(client)
            }
            other => bail!("Expected welcome, got {:?}", other),
        }
    }

    pub async fn send(&mut self, message: &ClientMessage) -> Result<()> {
        let text = serde_json::to_string(message)?;
        self.send_raw(&text).await
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.socket
            .send(Message::text(text.to_owned()))
            .await
            .context("WebSocket send failed")
    }

    /// Next server message, failing after [`SIGNAL_TIMEOUT_MS`].
    pub async fn recv(&mut self) -> Result<ServerMessage> {
        let deadline = Duration::from_millis(SIGNAL_TIMEOUT_MS);
        tokio::time::timeout(deadline, self.next_message())
            .await
            .context("Timeout waiting for server message")?
    }

    /// Returns `None` if nothing arrives within [`QUIET_PERIOD_MS`].
    pub async fn try_recv(&mut self) -> Option<ServerMessage> {
        let quiet = Duration::from_millis(QUIET_PERIOD_MS);
        match tokio::time::timeout(quiet, self.next_message()).await {
            Ok(Ok(message)) => Some(message),
            _ => None,
        }
    }

    async fn next_message(&mut self) -> Result<ServerMessage> {
        loop {
            let frame = self
                .socket
                .next()
                .await
                .context("WebSocket closed")?
                .context("WebSocket error")?;

            match frame {
                Message::Text(text) => {
                    return serde_json::from_str(text.as_str()).context("Bad ServerMessage");
                }
                Message::Close(_) => bail!("WebSocket closed by server"),
                _ => continue,
            }
        }
    }

    /// Sends `create-room` and returns the reply from the matching ack.
    pub async fn create_room(&mut self, room_id: &str) -> Result<Reply> {
        let req = RequestId::new();
        self.send(&ClientMessage::CreateRoom {
            req,
            room_id: RoomId::from(room_id),
        })
        .await?;
        self.wait_ack(req).await
    }

    pub async fn join_room(&mut self, room_id: &str) -> Result<Reply> {
        let req = RequestId::new();
        self.send(&ClientMessage::JoinRequest {
            req,
            room_id: RoomId::from(room_id),
        })
        .await?;
        self.wait_ack(req).await
    }

    async fn wait_ack(&mut self, req: RequestId) -> Result<Reply> {
        loop {
            match self.recv().await? {
                ServerMessage::Ack { req: got, reply } if got == req => return Ok(reply),
                other => tracing::debug!("[TestClient] skipping {:?}", other),
            }
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.socket.close(None).await.context("WebSocket close failed")
    }
}

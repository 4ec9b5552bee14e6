use crate::session::{SessionCommand, SessionError};
use crate::transfer::SendHandle;
use bytes::Bytes;
use clipshare_core::{ClipboardKind, ErrorReason, JoinStatus, PeerId, RoomId};
use tokio::sync::{mpsc, oneshot};

/// Cloneable front end of a running [`crate::SessionController`].
#[derive(Clone, Debug)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub fn new(sender: mpsc::Sender<SessionCommand>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, SessionError>>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    /// Creates a room and becomes its host.
    pub async fn create_room(&self, code: &str) -> Result<JoinStatus, SessionError> {
        let room_id = parse_code(code)?;
        self.request(|respond_to| SessionCommand::CreateRoom {
            room_id,
            respond_to,
        })
        .await
    }

    /// Asks to join; `Pending` until the host decides.
    pub async fn join_room(&self, code: &str) -> Result<JoinStatus, SessionError> {
        let room_id = parse_code(code)?;
        self.request(|respond_to| SessionCommand::JoinRoom {
            room_id,
            respond_to,
        })
        .await
    }

    pub async fn decide(&self, requester_id: PeerId, approve: bool) -> Result<(), SessionError> {
        self.request(|respond_to| SessionCommand::Decide {
            requester_id,
            approve,
            respond_to,
        })
        .await
    }

    /// Broadcasts clipboard content to the rest of the room through the
    /// broker.
    pub async fn share_clipboard(
        &self,
        content: impl Into<String>,
        kind: ClipboardKind,
    ) -> Result<(), SessionError> {
        let content = content.into();
        self.request(|respond_to| SessionCommand::ShareClipboard {
            content,
            kind,
            respond_to,
        })
        .await
    }

    /// Starts a paced send to every currently connected peer.
    pub async fn send_payload(
        &self,
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Result<SendHandle, SessionError> {
        let (name, content_type, data) = (name.into(), content_type.into(), data.into());
        self.request(|respond_to| SessionCommand::SendPayload {
            name,
            content_type,
            data,
            respond_to,
        })
        .await
    }

    pub async fn connected_peers(&self) -> Result<Vec<PeerId>, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::ConnectedPeers { respond_to: tx })
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    pub async fn shutdown(&self) {
        let _ = self.sender.send(SessionCommand::Shutdown).await;
    }
}

fn parse_code(code: &str) -> Result<RoomId, SessionError> {
    RoomId::parse(code).map_err(|_| SessionError::Rejected(ErrorReason::InvalidRoomId))
}

use crate::room::Room;
use clipshare_core::{ClientMessage, ClipboardKind, PeerId, RequestId, RoomId, SignalEnvelope};
use tokio::sync::oneshot;

/// Commands fed to the room hub by the WebSocket layer.
#[derive(Debug)]
pub enum HubCommand {
    CreateRoom {
        peer_id: PeerId,
        req: RequestId,
        room_id: RoomId,
    },

    JoinRequest {
        peer_id: PeerId,
        req: RequestId,
        room_id: RoomId,
    },

    /// Host approves or denies a pending requester.
    HostResponse {
        peer_id: PeerId,
        room_id: RoomId,
        requester_id: PeerId,
        approved: bool,
    },

    /// Negotiation envelope to forward to `target_id`.
    Signal {
        peer_id: PeerId,
        target_id: PeerId,
        envelope: SignalEnvelope,
    },

    ClipboardUpdate {
        peer_id: PeerId,
        room_id: RoomId,
        content: String,
        kind: ClipboardKind,
    },

    /// The peer's socket closed.
    Disconnect { peer_id: PeerId },

    /// Snapshot of one room, for inspection.
    Inspect {
        room_id: RoomId,
        respond_to: oneshot::Sender<Option<Room>>,
    },
}

impl HubCommand {
    /// Attributes a decoded client message to the connection it arrived on.
    pub fn from_client(peer_id: PeerId, message: ClientMessage) -> Self {
        match message {
            ClientMessage::CreateRoom { req, room_id } => Self::CreateRoom {
                peer_id,
                req,
                room_id,
            },
            ClientMessage::JoinRequest { req, room_id } => Self::JoinRequest {
                peer_id,
                req,
                room_id,
            },
            ClientMessage::HostResponse {
                room_id,
                requester_id,
                approved,
            } => Self::HostResponse {
                peer_id,
                room_id,
                requester_id,
                approved,
            },
            ClientMessage::Signal {
                target_id,
                envelope,
                ..
            } => Self::Signal {
                peer_id,
                target_id,
                envelope,
            },
            ClientMessage::ClipboardUpdate {
                room_id,
                content,
                kind,
            } => Self::ClipboardUpdate {
                peer_id,
                room_id,
                content,
                kind,
            },
        }
    }
}

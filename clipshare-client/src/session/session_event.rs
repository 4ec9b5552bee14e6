use crate::transfer::ReceivedPayload;
use clipshare_core::{ClipboardKind, ErrorReason, IceServerConfig, PeerId, RoomId};

/// What the session reports to the application.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The broker assigned our connection id.
    Welcomed {
        peer_id: PeerId,
        ice_servers: Vec<IceServerConfig>,
    },

    /// Host only: someone asks to join.
    JoinRequested {
        room_id: RoomId,
        requester_id: PeerId,
    },

    JoinApproved {
        room_id: RoomId,
        host_id: PeerId,
    },

    JoinDenied {
        room_id: RoomId,
    },

    RoomClosed {
        room_id: RoomId,
    },

    PeerConnected {
        peer_id: PeerId,
    },

    PeerDisconnected {
        peer_id: PeerId,
    },

    PayloadReceived(ReceivedPayload),

    ClipboardReceived {
        content: String,
        kind: ClipboardKind,
        sender_id: PeerId,
    },

    /// The broker could not decode something we sent.
    ServerError {
        reason: ErrorReason,
    },
}

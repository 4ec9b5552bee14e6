use crate::session::SessionError;
use crate::transfer::SendHandle;
use bytes::Bytes;
use clipshare_core::{ClipboardKind, JoinStatus, PeerId, RoomId};
use tokio::sync::oneshot;

pub type Responder<T> = oneshot::Sender<Result<T, SessionError>>;

/// Requests from [`crate::SessionHandle`] to the controller.
pub enum SessionCommand {
    CreateRoom {
        room_id: RoomId,
        respond_to: Responder<JoinStatus>,
    },

    JoinRoom {
        room_id: RoomId,
        respond_to: Responder<JoinStatus>,
    },

    /// Host decision on a pending requester.
    Decide {
        requester_id: PeerId,
        approve: bool,
        respond_to: Responder<()>,
    },

    ShareClipboard {
        content: String,
        kind: ClipboardKind,
        respond_to: Responder<()>,
    },

    SendPayload {
        name: String,
        content_type: String,
        data: Bytes,
        respond_to: Responder<SendHandle>,
    },

    ConnectedPeers {
        respond_to: oneshot::Sender<Vec<PeerId>>,
    },

    Shutdown,
}

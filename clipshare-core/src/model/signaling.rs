use crate::model::envelope::SignalEnvelope;
use crate::model::error::ErrorReason;
use crate::model::peer::PeerId;
use crate::model::request::RequestId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardKind {
    #[default]
    Text,
    Image,
    File,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JoinStatus {
    Joined,
    Pending,
}

/// Body of an `ack`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Reply {
    Created,
    Join { status: JoinStatus },
    Failed { reason: ErrorReason },
}

/// Messages a participant sends to the broker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ClientMessage {
    CreateRoom {
        req: RequestId,
        room_id: RoomId,
    },
    JoinRequest {
        req: RequestId,
        room_id: RoomId,
    },
    HostResponse {
        room_id: RoomId,
        requester_id: PeerId,
        approved: bool,
    },
    Signal {
        target_id: PeerId,
        envelope: SignalEnvelope,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<RoomId>,
    },
    ClipboardUpdate {
        room_id: RoomId,
        content: String,
        #[serde(default)]
        kind: ClipboardKind,
    },
}

/// Messages the broker sends to a participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ServerMessage {
    Welcome {
        peer_id: PeerId,
        ice_servers: Vec<IceServerConfig>,
    },
    Ack {
        req: RequestId,
        reply: Reply,
    },
    UserRequestingJoin {
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
    Signal {
        sender_id: PeerId,
        envelope: SignalEnvelope,
    },
    ClipboardUpdated {
        content: String,
        kind: ClipboardKind,
        sender_id: PeerId,
    },
    Error {
        reason: ErrorReason,
    },
}

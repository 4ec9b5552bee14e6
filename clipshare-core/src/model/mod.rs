mod envelope;
mod error;
mod peer;
mod request;
mod room;
mod signaling;

pub use envelope::{OPENING_KIND, SignalEnvelope};
pub use error::ErrorReason;
pub use peer::PeerId;
pub use request::RequestId;
pub use room::{ROOM_CODE_LEN, ROOM_CODE_MAX_LEN, RoomId, RoomIdError};
pub use signaling::{
    ClientMessage, ClipboardKind, IceServerConfig, JoinStatus, Reply, ServerMessage,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why the broker refused a request. Sent to the requesting client only.
#[derive(Debug, Error, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorReason {
    #[error("room already exists")]
    RoomExists,

    #[error("room not found")]
    RoomNotFound,

    #[error("invalid room code")]
    InvalidRoomId,

    #[error("malformed message")]
    Malformed,
}

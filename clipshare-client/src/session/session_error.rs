use clipshare_core::ErrorReason;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("broker refused the request: {0}")]
    Rejected(ErrorReason),

    #[error("no connected peer to send to")]
    TransferTargetUnavailable,

    #[error("not in a room")]
    NotInRoom,

    #[error("session controller has shut down")]
    Closed,
}

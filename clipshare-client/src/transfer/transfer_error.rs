use clipshare_core::PeerId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("no connected peer to send to")]
    TargetUnavailable,

    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error("chunk delivery to {peer} failed: {reason}")]
    ChunkDelivery { peer: PeerId, reason: String },
}

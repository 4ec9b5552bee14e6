use clipshare_core::PeerId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// A non-opening envelope arrived for a remote with no link.
    #[error("orphan signal from {0}: no link and not an offer")]
    OrphanSignal(PeerId),

    #[error("transport failure towards {remote}: {reason}")]
    Transport { remote: PeerId, reason: String },
}

impl LinkError {
    pub fn transport(remote: PeerId, reason: impl ToString) -> Self {
        Self::Transport {
            remote,
            reason: reason.to_string(),
        }
    }
}

use clipshare_core::{PeerId, ServerMessage};
use async_trait::async_trait;

/// Delivery side of the live connection table.
///
/// The hub only ever talks to clients through this trait, so tests can swap
/// in a recorder instead of real sockets.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Queue `message` for `peer_id`. Returns false if the peer has no live connection.
    async fn deliver(&self, peer_id: PeerId, message: ServerMessage) -> bool;
}

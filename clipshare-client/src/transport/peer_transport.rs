use crate::link::{LinkError, LinkHandle, Role};
use crate::transport::TransportEvent;
use async_trait::async_trait;
use bytes::Bytes;
use clipshare_core::SignalEnvelope;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Bidirectional channel to one remote peer.
///
/// Everything the transport observes (local envelopes to relay, channel
/// open, inbound frames, close) is reported as a [`TransportEvent`] tagged
/// with the link handle it was opened for.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Feeds an envelope received from the remote through the broker.
    async fn signal(&self, envelope: SignalEnvelope) -> Result<(), LinkError>;

    async fn send(&self, frame: Bytes) -> Result<(), LinkError>;

    async fn close(&self);
}

/// Creates transports for new links.
#[async_trait]
pub trait Connector: Send + Sync {
    /// An initiator transport starts negotiating right away; a responder
    /// waits for the remote's offer.
    async fn open(
        &self,
        link: LinkHandle,
        role: Role,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> anyhow::Result<Arc<dyn PeerTransport>>;
}

use crate::signaling::SignalingOutput;
use clipshare_core::{PeerId, ServerMessage, SignalEnvelope};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Delivered,
    /// Target has no live connection. Not an error for the sender.
    Dropped,
}

/// Point-to-point forwarding of negotiation envelopes, keyed by connection id.
///
/// Envelopes are passed through untouched; the relay does not know or care
/// which negotiation protocol the peers speak.
#[derive(Clone)]
pub struct Relay {
    output: Arc<dyn SignalingOutput>,
}

impl Relay {
    pub fn new(output: Arc<dyn SignalingOutput>) -> Self {
        Self { output }
    }

    pub async fn relay(
        &self,
        sender_id: PeerId,
        target_id: PeerId,
        envelope: SignalEnvelope,
    ) -> RelayOutcome {
        debug!(
            "Signaling: {} -> {} ({})",
            sender_id,
            target_id,
            envelope.kind().unwrap_or("?")
        );

        let message = ServerMessage::Signal {
            sender_id,
            envelope,
        };
        if self.output.deliver(target_id, message).await {
            RelayOutcome::Delivered
        } else {
            debug!("Dropped signal for departed peer {}", target_id);
            RelayOutcome::Dropped
        }
    }
}

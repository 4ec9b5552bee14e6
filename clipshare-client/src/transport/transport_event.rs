use crate::link::LinkHandle;
use bytes::Bytes;
use clipshare_core::SignalEnvelope;

/// Events transports emit for the session controller.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Local envelope to relay to the remote.
    Signal {
        link: LinkHandle,
        envelope: SignalEnvelope,
    },

    /// The data channel is open and ready for frames.
    Connected { link: LinkHandle },

    Data { link: LinkHandle, frame: Bytes },

    /// The connection failed or was closed by either side.
    Closed { link: LinkHandle },
}

impl TransportEvent {
    pub fn link(&self) -> LinkHandle {
        match self {
            TransportEvent::Signal { link, .. }
            | TransportEvent::Connected { link }
            | TransportEvent::Data { link, .. }
            | TransportEvent::Closed { link } => *link,
        }
    }
}

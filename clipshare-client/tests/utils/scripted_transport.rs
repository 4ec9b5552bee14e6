use async_trait::async_trait;
use bytes::Bytes;
use clipshare_client::{Connector, LinkError, LinkHandle, PeerTransport, Role, TransportEvent};
use clipshare_core::SignalEnvelope;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// A transport the test drives by hand.
pub struct ScriptedTransport {
    pub link: LinkHandle,
    pub role: Role,
    pub events: mpsc::UnboundedSender<TransportEvent>,
    /// When set, an offer is answered after this long, like a real
    /// negotiation would be.
    pub answer_delay: Option<Duration>,
    pub signals: Mutex<Vec<SignalEnvelope>>,
    pub sent: Mutex<Vec<Bytes>>,
    pub closed: AtomicBool,
}

impl ScriptedTransport {
    pub async fn inject(&self, event: TransportEvent) {
        self.events.send(event).unwrap();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PeerTransport for ScriptedTransport {
    async fn signal(&self, envelope: SignalEnvelope) -> Result<(), LinkError> {
        let opening = envelope.is_opening();
        self.signals.lock().unwrap().push(envelope);
        if let (true, Some(delay)) = (opening, self.answer_delay) {
            tokio::time::sleep(delay).await;
            let _ = self.events.send(TransportEvent::Signal {
                link: self.link,
                envelope: SignalEnvelope::answer("v=0 answer"),
            });
        }
        Ok(())
    }

    async fn send(&self, frame: Bytes) -> Result<(), LinkError> {
        self.sent.lock().unwrap().push(frame);
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Connector recording every transport it opens.
#[derive(Default, Clone)]
pub struct ScriptedConnector {
    opened: Arc<Mutex<Vec<Arc<ScriptedTransport>>>>,
    answer_delay: Option<Duration>,
}

impl ScriptedConnector {
    pub fn answering_after(delay: Duration) -> Self {
        Self {
            answer_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn opened(&self) -> Vec<Arc<ScriptedTransport>> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn open(
        &self,
        link: LinkHandle,
        role: Role,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> anyhow::Result<Arc<dyn PeerTransport>> {
        let transport = Arc::new(ScriptedTransport {
            link,
            role,
            events,
            answer_delay: self.answer_delay,
            signals: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        });
        self.opened.lock().unwrap().push(transport.clone());
        Ok(transport)
    }
}

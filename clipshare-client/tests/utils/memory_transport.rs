use async_trait::async_trait;
use bytes::Bytes;
use clipshare_client::{Connector, LinkError, LinkHandle, PeerTransport, Role, TransportEvent};
use clipshare_core::{PeerId, SignalEnvelope};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Clone)]
struct Endpoint {
    link: LinkHandle,
    events: mpsc::UnboundedSender<TransportEvent>,
}

/// Shared medium for in-memory transports, keyed by (owner, remote).
#[derive(Default)]
pub struct MemoryNetwork {
    endpoints: Mutex<HashMap<(PeerId, PeerId), Endpoint>>,
}

impl MemoryNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn connector(self: &Arc<Self>, owner: PeerId) -> MemoryConnector {
        MemoryConnector {
            owner,
            network: self.clone(),
        }
    }

    fn register(&self, owner: PeerId, link: LinkHandle, events: mpsc::UnboundedSender<TransportEvent>) {
        self.endpoints
            .lock()
            .unwrap()
            .insert((owner, link.remote), Endpoint { link, events });
    }

    fn unregister(&self, owner: PeerId, link: LinkHandle) {
        let mut endpoints = self.endpoints.lock().unwrap();
        if endpoints.get(&(owner, link.remote)).map(|e| e.link) == Some(link) {
            endpoints.remove(&(owner, link.remote));
        }
    }

    /// The endpoint `remote` holds towards `owner`, if it is the given generation.
    fn peer_endpoint(&self, owner: PeerId, remote: PeerId, generation: u64) -> Option<Endpoint> {
        self.endpoints
            .lock()
            .unwrap()
            .get(&(remote, owner))
            .filter(|e| e.link.generation == generation)
            .cloned()
    }
}

pub struct MemoryConnector {
    owner: PeerId,
    network: Arc<MemoryNetwork>,
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn open(
        &self,
        link: LinkHandle,
        role: Role,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> anyhow::Result<Arc<dyn PeerTransport>> {
        self.network.register(self.owner, link, events.clone());
        let transport = MemoryTransport {
            owner: self.owner,
            link,
            network: self.network.clone(),
            events,
            paired: Mutex::new(None),
            closed: AtomicBool::new(false),
        };
        if role == Role::Initiator {
            transport.emit_signal(SignalEnvelope::offer(link.generation.to_string()));
        }
        Ok(Arc::new(transport))
    }
}

/// Loopback transport: the "sdp" of offers and answers is the sender's
/// link generation, which pairs the two ends.
pub struct MemoryTransport {
    owner: PeerId,
    link: LinkHandle,
    network: Arc<MemoryNetwork>,
    events: mpsc::UnboundedSender<TransportEvent>,
    paired: Mutex<Option<u64>>,
    closed: AtomicBool,
}

impl MemoryTransport {
    fn emit_signal(&self, envelope: SignalEnvelope) {
        let _ = self.events.send(TransportEvent::Signal {
            link: self.link,
            envelope,
        });
    }

    fn emit_connected(&self) {
        let _ = self.events.send(TransportEvent::Connected { link: self.link });
    }

    fn pair_with(&self, envelope: &SignalEnvelope) -> Result<(), LinkError> {
        let generation = envelope
            .sdp()
            .and_then(|sdp| sdp.parse::<u64>().ok())
            .ok_or_else(|| LinkError::transport(self.link.remote, "unparsable sdp"))?;
        *self.paired.lock().unwrap() = Some(generation);
        Ok(())
    }

    fn remote_endpoint(&self) -> Option<Endpoint> {
        let generation = (*self.paired.lock().unwrap())?;
        self.network
            .peer_endpoint(self.owner, self.link.remote, generation)
    }
}

#[async_trait]
impl PeerTransport for MemoryTransport {
    async fn signal(&self, envelope: SignalEnvelope) -> Result<(), LinkError> {
        match envelope.kind() {
            Some("offer") => {
                self.pair_with(&envelope)?;
                self.emit_signal(SignalEnvelope::answer(self.link.generation.to_string()));
                self.emit_connected();
            }
            Some("answer") => {
                self.pair_with(&envelope)?;
                self.emit_connected();
            }
            _ => {}
        }
        Ok(())
    }

    async fn send(&self, frame: Bytes) -> Result<(), LinkError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(LinkError::transport(self.link.remote, "closed"));
        }
        let endpoint = self
            .remote_endpoint()
            .ok_or_else(|| LinkError::transport(self.link.remote, "remote gone"))?;
        endpoint
            .events
            .send(TransportEvent::Data {
                link: endpoint.link,
                frame,
            })
            .map_err(|e| LinkError::transport(self.link.remote, e))
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let remote = self.remote_endpoint();
        self.network.unregister(self.owner, self.link);
        if let Some(endpoint) = remote {
            let _ = endpoint.events.send(TransportEvent::Closed {
                link: endpoint.link,
            });
        }
    }
}

use crate::utils::{MemoryBroker, MemoryNetwork};
use clipshare_client::{SessionController, SessionEvent, SessionHandle};
use clipshare_core::PeerId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Timeout for a single expected session event (ms).
pub const EVENT_TIMEOUT_MS: u64 = 3000;

/// How long to wait before concluding nothing more is coming (ms).
pub const QUIET_PERIOD_MS: u64 = 300;

/// A session controller wired to the in-memory broker and network.
pub struct TestPeer {
    pub id: PeerId,
    pub handle: SessionHandle,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
}

impl TestPeer {
    pub async fn connect(broker: &MemoryBroker, network: &Arc<MemoryNetwork>) -> Self {
        let id = PeerId::new();
        let (server_rx, outbound) = broker.connect(id);
        let (handle, events) =
            SessionController::spawn(Arc::new(network.connector(id)), server_rx, outbound);

        let mut peer = Self { id, handle, events };
        match peer.next_event().await {
            SessionEvent::Welcomed { peer_id, .. } => assert_eq!(peer_id, id),
            other => panic!("expected welcome, got {:?}", other),
        }
        peer
    }

    pub async fn next_event(&mut self) -> SessionEvent {
        tokio::time::timeout(Duration::from_millis(EVENT_TIMEOUT_MS), self.events.recv())
            .await
            .expect("timeout waiting for session event")
            .expect("session event channel closed")
    }

    /// Skips events until one matches.
    pub async fn wait_for(&mut self, pred: impl Fn(&SessionEvent) -> bool) -> SessionEvent {
        loop {
            let event = self.next_event().await;
            if pred(&event) {
                return event;
            }
            tracing::debug!("[TestPeer {}] skipping {:?}", self.id, event);
        }
    }

    /// Everything emitted until the session stays quiet.
    pub async fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut out = Vec::new();
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(QUIET_PERIOD_MS), self.events.recv()).await
        {
            out.push(event);
        }
        out
    }
}

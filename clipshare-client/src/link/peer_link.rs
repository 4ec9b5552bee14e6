use crate::link::{LinkEvent, LinkState, Role};
use crate::transport::PeerTransport;
use clipshare_core::PeerId;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Identity of one link registration.
///
/// A remote can be registered many times over a session; the generation
/// tells registrations apart so a stale handle never touches a newer link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkHandle {
    pub remote: PeerId,
    pub generation: u64,
}

impl fmt::Display for LinkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.remote, self.generation)
    }
}

pub struct PeerLink {
    handle: LinkHandle,
    role: Role,
    state: LinkState,
    was_connected: bool,
    cancel: CancellationToken,
    transport: Option<Arc<dyn PeerTransport>>,
}

impl PeerLink {
    pub(crate) fn new(handle: LinkHandle, role: Role) -> Self {
        let mut link = Self {
            handle,
            role,
            state: LinkState::Idle,
            was_connected: false,
            cancel: CancellationToken::new(),
            transport: None,
        };
        link.apply(LinkEvent::Start(role));
        link
    }

    pub fn handle(&self) -> LinkHandle {
        self.handle
    }

    pub fn remote(&self) -> PeerId {
        self.handle.remote
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// True once the link has been Connected, even after it closed.
    pub fn was_connected(&self) -> bool {
        self.was_connected
    }

    /// Fires when the link is torn down; paced senders watch it.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn transport(&self) -> Option<Arc<dyn PeerTransport>> {
        self.transport.clone()
    }

    pub(crate) fn attach(&mut self, transport: Arc<dyn PeerTransport>) {
        self.transport = Some(transport);
    }

    /// Applies `event`; illegal transitions leave the state untouched.
    pub(crate) fn apply(&mut self, event: LinkEvent) -> bool {
        match self.state.on(event) {
            Some(next) => {
                self.state = next;
                self.was_connected |= next == LinkState::Connected;
                true
            }
            None => {
                warn!(
                    "Link {}: illegal transition {:?} on {:?}",
                    self.handle, self.state, event
                );
                false
            }
        }
    }

    /// Closes the link and cancels everything tied to its token.
    pub(crate) fn shut(&mut self) {
        self.cancel.cancel();
        if self.state.is_live() {
            self.state = LinkState::Closed;
        }
    }
}

impl fmt::Debug for PeerLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerLink")
            .field("handle", &self.handle)
            .field("role", &self.role)
            .field("state", &self.state)
            .field("has_transport", &self.transport.is_some())
            .finish()
    }
}

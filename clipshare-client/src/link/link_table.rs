use crate::link::{LinkError, LinkEvent, LinkHandle, LinkState, PeerLink, Role};
use crate::transfer::TransferTarget;
use crate::transport::PeerTransport;
use clipshare_core::PeerId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a link request or inbound envelope was resolved.
#[derive(Debug)]
pub enum Admission {
    /// A live link already existed and keeps handling the remote.
    Existing(LinkHandle),
    Created(LinkHandle),
    /// An opening envelope replaced a live link. The retired link is
    /// already shut; the caller closes its transport.
    Superseded {
        handle: LinkHandle,
        retired: PeerLink,
    },
}

impl Admission {
    pub fn handle(&self) -> LinkHandle {
        match self {
            Admission::Existing(h) | Admission::Created(h) => *h,
            Admission::Superseded { handle, .. } => *handle,
        }
    }

    /// True when the caller must bring up a transport for the handle.
    pub fn is_new(&self) -> bool {
        !matches!(self, Admission::Existing(_))
    }
}

/// All peer links of one client, at most one per remote.
#[derive(Debug, Default)]
pub struct LinkTable {
    links: HashMap<PeerId, PeerLink>,
    next_generation: u64,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn get(&self, remote: &PeerId) -> Option<&PeerLink> {
        self.links.get(remote)
    }

    /// The link behind `handle`, if it is still the current registration.
    pub fn current(&self, handle: LinkHandle) -> Option<&PeerLink> {
        self.links
            .get(&handle.remote)
            .filter(|link| link.handle().generation == handle.generation)
    }

    fn current_mut(&mut self, handle: LinkHandle) -> Option<&mut PeerLink> {
        self.links
            .get_mut(&handle.remote)
            .filter(|link| link.handle().generation == handle.generation)
    }

    pub fn is_current(&self, handle: LinkHandle) -> bool {
        self.current(handle).is_some()
    }

    /// Explicitly opens a link to `remote`, reusing a live one.
    pub fn open(&mut self, remote: PeerId, role: Role) -> Admission {
        if let Some(link) = self.links.get(&remote) {
            debug!("Link to {} already exists as {}", remote, link.handle());
            return Admission::Existing(link.handle());
        }
        Admission::Created(self.insert(remote, role))
    }

    /// Routes an inbound envelope from `remote`.
    ///
    /// An opening envelope creates a responder, superseding any live link.
    /// Anything else needs a link already in place.
    pub fn accept_signal(
        &mut self,
        remote: PeerId,
        is_opening: bool,
    ) -> Result<Admission, LinkError> {
        match (self.links.contains_key(&remote), is_opening) {
            (false, false) => {
                warn!("Dropping orphan signal from {}", remote);
                Err(LinkError::OrphanSignal(remote))
            }
            (false, true) => Ok(Admission::Created(self.insert(remote, Role::Responder))),
            (true, false) => Ok(Admission::Existing(self.links[&remote].handle())),
            (true, true) => {
                let mut retired = self
                    .links
                    .remove(&remote)
                    .ok_or(LinkError::OrphanSignal(remote))?;
                retired.shut();
                let handle = self.insert(remote, Role::Responder);
                info!("Link {} superseded by {}", retired.handle(), handle);
                Ok(Admission::Superseded { handle, retired })
            }
        }
    }

    fn insert(&mut self, remote: PeerId, role: Role) -> LinkHandle {
        self.next_generation += 1;
        let handle = LinkHandle {
            remote,
            generation: self.next_generation,
        };
        self.links.insert(remote, PeerLink::new(handle, role));
        handle
    }

    pub fn attach(&mut self, handle: LinkHandle, transport: Arc<dyn PeerTransport>) -> bool {
        match self.current_mut(handle) {
            Some(link) => {
                link.attach(transport);
                true
            }
            None => false,
        }
    }

    /// Applies `event` to the current registration of `handle`.
    pub fn transition(&mut self, handle: LinkHandle, event: LinkEvent) -> Option<LinkState> {
        let link = self.current_mut(handle)?;
        link.apply(event).then(|| link.state())
    }

    /// Marks the link Connected. False for stale handles and illegal moves.
    pub fn mark_connected(&mut self, handle: LinkHandle) -> bool {
        self.transition(handle, LinkEvent::ChannelOpen) == Some(LinkState::Connected)
    }

    /// Removes the link only if `handle` is still its current registration.
    pub fn retire(&mut self, handle: LinkHandle) -> Option<PeerLink> {
        if !self.is_current(handle) {
            debug!("Ignoring retire of stale link {}", handle);
            return None;
        }
        let mut link = self.links.remove(&handle.remote)?;
        link.shut();
        Some(link)
    }

    /// Shuts and removes every link.
    pub fn drain(&mut self) -> Vec<PeerLink> {
        self.links
            .drain()
            .map(|(_, mut link)| {
                link.shut();
                link
            })
            .collect()
    }

    pub fn connected(&self) -> Vec<LinkHandle> {
        let mut handles: Vec<_> = self
            .links
            .values()
            .filter(|link| link.state() == LinkState::Connected)
            .map(PeerLink::handle)
            .collect();
        handles.sort_by_key(|h| h.remote);
        handles
    }

    /// Send targets for every Connected link that has a transport.
    pub fn transfer_targets(&self) -> Vec<TransferTarget> {
        self.connected()
            .into_iter()
            .filter_map(|handle| {
                let link = self.current(handle)?;
                Some(TransferTarget {
                    handle,
                    transport: link.transport()?,
                    cancel: link.cancel_token(),
                })
            })
            .collect()
    }
}

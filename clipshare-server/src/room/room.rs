use clipshare_core::{PeerId, RoomId};
use std::collections::HashSet;

/// One room: a host, its admitted members and the requesters waiting on the host.
///
/// Invariants: `host_id ∈ members` and `pending ∩ members = ∅`. Only
/// [`RoomRegistry`](crate::room::RoomRegistry) mutates a room, and every
/// mutation keeps both.
#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    host_id: PeerId,
    members: HashSet<PeerId>,
    pending: HashSet<PeerId>,
}

impl Room {
    pub(crate) fn new(id: RoomId, host_id: PeerId) -> Self {
        Self {
            id,
            host_id,
            members: HashSet::from([host_id]),
            pending: HashSet::new(),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn host_id(&self) -> PeerId {
        self.host_id
    }

    pub fn members(&self) -> &HashSet<PeerId> {
        &self.members
    }

    pub fn pending(&self) -> &HashSet<PeerId> {
        &self.pending
    }

    pub fn is_member(&self, peer_id: &PeerId) -> bool {
        self.members.contains(peer_id)
    }

    pub fn is_pending(&self, peer_id: &PeerId) -> bool {
        self.pending.contains(peer_id)
    }

    /// Checks both room invariants.
    pub fn is_consistent(&self) -> bool {
        self.members.contains(&self.host_id) && self.pending.is_disjoint(&self.members)
    }

    pub(crate) fn add_pending(&mut self, peer_id: PeerId) {
        if !self.members.contains(&peer_id) {
            self.pending.insert(peer_id);
        }
    }

    /// Moves a pending requester into the member set. Returns false if it was not pending.
    pub(crate) fn admit(&mut self, peer_id: &PeerId) -> bool {
        if !self.pending.remove(peer_id) {
            return false;
        }
        self.members.insert(*peer_id);
        true
    }

    pub(crate) fn reject(&mut self, peer_id: &PeerId) -> bool {
        self.pending.remove(peer_id)
    }

    /// Drops a non-host participant from both sets.
    pub(crate) fn forget(&mut self, peer_id: &PeerId) {
        if *peer_id == self.host_id {
            return;
        }
        self.members.remove(peer_id);
        self.pending.remove(peer_id);
    }
}

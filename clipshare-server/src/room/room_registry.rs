use crate::room::Room;
use clipshare_core::{ErrorReason, JoinStatus, PeerId, RoomId, RoomIdError, ServerMessage};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("room {0} already exists")]
    RoomExists(RoomId),

    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    #[error("invalid room code: {0}")]
    InvalidRoomId(#[from] RoomIdError),
}

impl RegistryError {
    /// What the requesting client is told.
    pub fn reason(&self) -> ErrorReason {
        match self {
            Self::RoomExists(_) => ErrorReason::RoomExists,
            Self::RoomNotFound(_) => ErrorReason::RoomNotFound,
            Self::InvalidRoomId(_) => ErrorReason::InvalidRoomId,
        }
    }
}

/// A server message addressed to one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub to: PeerId,
    pub message: ServerMessage,
}

impl Notice {
    pub fn new(to: PeerId, message: ServerMessage) -> Self {
        Self { to, message }
    }
}

/// Owns every room. Operations never deliver anything: they return the
/// notices the caller must send, so each call is a single atomic step.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn create_room(&mut self, room_id: RoomId, creator: PeerId) -> Result<(), RegistryError> {
        room_id.validate()?;

        if self.rooms.contains_key(&room_id) {
            return Err(RegistryError::RoomExists(room_id));
        }

        info!("Room created: {} by {}", room_id, creator);
        self.rooms
            .insert(room_id.clone(), Room::new(room_id, creator));
        Ok(())
    }

    /// Members rejoin idempotently; anyone else waits for the host.
    pub fn request_join(
        &mut self,
        room_id: &RoomId,
        requester: PeerId,
    ) -> Result<(JoinStatus, Vec<Notice>), RegistryError> {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return Err(RegistryError::RoomNotFound(room_id.clone()));
        };

        if room.is_member(&requester) {
            debug!("{} rejoined room {}", requester, room_id);
            return Ok((JoinStatus::Joined, Vec::new()));
        }

        room.add_pending(requester);
        info!("Join request for {} from {}", room_id, requester);

        let notice = Notice::new(
            room.host_id(),
            ServerMessage::UserRequestingJoin {
                room_id: room_id.clone(),
                requester_id: requester,
            },
        );
        Ok((JoinStatus::Pending, vec![notice]))
    }

    /// Host decision on a pending requester.
    ///
    /// Any violated precondition (unknown room, decider not host, requester
    /// not pending) is a silent no-op so a non-host learns nothing.
    pub fn decide(
        &mut self,
        room_id: &RoomId,
        decider: PeerId,
        requester: PeerId,
        approve: bool,
    ) -> Vec<Notice> {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return Vec::new();
        };
        if room.host_id() != decider || !room.is_pending(&requester) {
            debug!(
                "Ignoring decision on {} in {} from {}",
                requester, room_id, decider
            );
            return Vec::new();
        }

        if approve {
            room.admit(&requester);
            info!("{} admitted to {}", requester, room_id);
            vec![Notice::new(
                requester,
                ServerMessage::JoinApproved {
                    room_id: room_id.clone(),
                    host_id: room.host_id(),
                },
            )]
        } else {
            room.reject(&requester);
            info!("{} denied entry to {}", requester, room_id);
            vec![Notice::new(
                requester,
                ServerMessage::JoinDenied {
                    room_id: room_id.clone(),
                },
            )]
        }
    }

    /// Closes every room hosted by `conn` and forgets it everywhere else.
    pub fn on_disconnect(&mut self, conn: PeerId) -> Vec<Notice> {
        let mut notices = Vec::new();

        let hosted: Vec<RoomId> = self
            .rooms
            .values()
            .filter(|room| room.host_id() == conn)
            .map(|room| room.id().clone())
            .collect();

        for room_id in hosted {
            let Some(room) = self.rooms.remove(&room_id) else {
                continue;
            };
            info!("Host {} left, closing room {}", conn, room_id);

            notices.extend(room.members().iter().filter(|m| **m != conn).map(|m| {
                Notice::new(
                    *m,
                    ServerMessage::RoomClosed {
                        room_id: room_id.clone(),
                    },
                )
            }));
            notices.extend(room.pending().iter().map(|p| {
                Notice::new(
                    *p,
                    ServerMessage::JoinDenied {
                        room_id: room_id.clone(),
                    },
                )
            }));
        }

        for room in self.rooms.values_mut() {
            room.forget(&conn);
        }

        notices
    }

    /// Every member of `room_id` except `sender`; empty unless `sender` is a member.
    pub fn members_except(&self, room_id: &RoomId, sender: &PeerId) -> Vec<PeerId> {
        match self.rooms.get(room_id) {
            Some(room) if room.is_member(sender) => room
                .members()
                .iter()
                .filter(|m| *m != sender)
                .copied()
                .collect(),
            _ => Vec::new(),
        }
    }
}

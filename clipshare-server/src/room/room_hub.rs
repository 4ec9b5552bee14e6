use crate::room::{HubCommand, Notice, Room, RoomRegistry};
use crate::signaling::{Relay, SignalingOutput};
use clipshare_core::{PeerId, Reply, RequestId, RoomId, ServerMessage};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum HubError {
    #[error("room hub has shut down")]
    Closed,
}

/// Cloneable sender side of the hub's command queue.
#[derive(Clone, Debug)]
pub struct RoomHubHandle {
    sender: mpsc::Sender<HubCommand>,
}

impl RoomHubHandle {
    pub fn new(sender: mpsc::Sender<HubCommand>) -> Self {
        Self { sender }
    }

    /// Creates a command queue of `buffer` slots and the handle feeding it.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<HubCommand>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(tx), rx)
    }

    pub async fn send(&self, command: HubCommand) -> Result<(), HubError> {
        self.sender.send(command).await.map_err(|_| HubError::Closed)
    }

    pub async fn room(&self, room_id: RoomId) -> Result<Option<Room>, HubError> {
        let (tx, rx) = oneshot::channel();
        self.send(HubCommand::Inspect {
            room_id,
            respond_to: tx,
        })
        .await?;
        rx.await.map_err(|_| HubError::Closed)
    }
}

/// Single-task owner of the room table.
///
/// Every command is handled to completion before the next is taken off the
/// queue, so registry mutations need no locking and the notices of one
/// command go out before anything caused by the next.
pub struct RoomHub {
    registry: RoomRegistry,
    relay: Relay,
    output: Arc<dyn SignalingOutput>,
    command_rx: mpsc::Receiver<HubCommand>,
}

impl RoomHub {
    pub fn new(command_rx: mpsc::Receiver<HubCommand>, output: Arc<dyn SignalingOutput>) -> Self {
        Self {
            registry: RoomRegistry::new(),
            relay: Relay::new(output.clone()),
            output,
            command_rx,
        }
    }

    /// Spawns a hub on the current runtime and returns its handle.
    pub fn spawn(output: Arc<dyn SignalingOutput>, buffer: usize) -> RoomHubHandle {
        let (handle, rx) = RoomHubHandle::channel(buffer);
        tokio::spawn(Self::new(rx, output).run());
        handle
    }

    pub async fn run(mut self) {
        info!("Room hub event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;
        }

        info!("Command channel closed. Room hub finished");
    }

    async fn handle_command(&mut self, cmd: HubCommand) {
        match cmd {
            HubCommand::CreateRoom {
                peer_id,
                req,
                room_id,
            } => {
                let reply = match self.registry.create_room(room_id, peer_id) {
                    Ok(()) => Reply::Created,
                    Err(e) => {
                        debug!("create-room from {} refused: {}", peer_id, e);
                        Reply::Failed { reason: e.reason() }
                    }
                };
                self.ack(peer_id, req, reply).await;
            }

            HubCommand::JoinRequest {
                peer_id,
                req,
                room_id,
            } => match self.registry.request_join(&room_id, peer_id) {
                Ok((status, notices)) => {
                    self.ack(peer_id, req, Reply::Join { status }).await;
                    self.dispatch(notices).await;
                }
                Err(e) => {
                    debug!("join-request from {} refused: {}", peer_id, e);
                    self.ack(peer_id, req, Reply::Failed { reason: e.reason() })
                        .await;
                }
            },

            HubCommand::HostResponse {
                peer_id,
                room_id,
                requester_id,
                approved,
            } => {
                let notices = self
                    .registry
                    .decide(&room_id, peer_id, requester_id, approved);
                self.dispatch(notices).await;
            }

            HubCommand::Signal {
                peer_id,
                target_id,
                envelope,
            } => {
                self.relay.relay(peer_id, target_id, envelope).await;
            }

            HubCommand::ClipboardUpdate {
                peer_id,
                room_id,
                content,
                kind,
            } => {
                let targets = self.registry.members_except(&room_id, &peer_id);
                if targets.is_empty() {
                    debug!("Clipboard update from {} reached nobody", peer_id);
                }
                let notices = targets
                    .into_iter()
                    .map(|to| {
                        Notice::new(
                            to,
                            ServerMessage::ClipboardUpdated {
                                content: content.clone(),
                                kind,
                                sender_id: peer_id,
                            },
                        )
                    })
                    .collect();
                self.dispatch(notices).await;
            }

            HubCommand::Disconnect { peer_id } => {
                info!("Client disconnected: {}", peer_id);
                let notices = self.registry.on_disconnect(peer_id);
                self.dispatch(notices).await;
            }

            HubCommand::Inspect {
                room_id,
                respond_to,
            } => {
                let _ = respond_to.send(self.registry.room(&room_id).cloned());
            }
        }
    }

    async fn ack(&self, peer_id: PeerId, req: RequestId, reply: Reply) {
        if !self
            .output
            .deliver(peer_id, ServerMessage::Ack { req, reply })
            .await
        {
            warn!("Requester {} left before its ack was sent", peer_id);
        }
    }

    async fn dispatch(&self, notices: Vec<Notice>) {
        for Notice { to, message } in notices {
            if !self.output.deliver(to, message).await {
                debug!("Notice for {} dropped: not connected", to);
            }
        }
    }
}

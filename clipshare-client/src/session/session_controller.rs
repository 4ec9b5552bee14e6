use crate::link::{Admission, LinkEvent, LinkHandle, LinkTable, PeerLink, Role};
use crate::session::{Responder, SessionCommand, SessionError, SessionEvent, SessionHandle};
use crate::transfer::{OutgoingTransfer, Reassembler};
use crate::transport::{Connector, PeerTransport, TransportEvent};
use clipshare_core::{
    ClientMessage, ErrorReason, JoinStatus, PeerId, Reply, RequestId, RoomId, ServerMessage,
    SignalEnvelope,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const COMMAND_BUFFER: usize = 32;

/// The room this client is in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomState {
    pub room_id: RoomId,
    /// Unknown when a re-join found us already a member.
    pub host_id: Option<PeerId>,
    pub is_host: bool,
}

enum PendingAck {
    Create {
        room_id: RoomId,
        respond_to: Responder<JoinStatus>,
    },
    Join {
        room_id: RoomId,
        respond_to: Responder<JoinStatus>,
    },
}

/// Client-side actor tying the broker connection, peer links and transfers
/// together.
///
/// Inputs are handle commands, server messages and transport events; each is
/// handled to completion before the next. Outputs go to the broker as
/// [`ClientMessage`]s and to the application as [`SessionEvent`]s.
pub struct SessionController {
    local_id: Option<PeerId>,
    room: Option<RoomState>,
    awaiting_approval: Option<RoomId>,

    links: LinkTable,
    incoming: Reassembler,
    pending_acks: HashMap<RequestId, PendingAck>,
    connector: Arc<dyn Connector>,

    command_rx: mpsc::Receiver<SessionCommand>,
    server_rx: mpsc::Receiver<ServerMessage>,
    outbound: mpsc::Sender<ClientMessage>,

    /// Cloned into every transport. Unbounded: transports emit from inside
    /// calls this actor awaits.
    transport_tx: mpsc::UnboundedSender<TransportEvent>,
    transport_rx: mpsc::UnboundedReceiver<TransportEvent>,

    events: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionController {
    /// `server_rx` carries decoded broker messages; `outbound` takes the ones
    /// to send back.
    pub fn new(
        connector: Arc<dyn Connector>,
        server_rx: mpsc::Receiver<ServerMessage>,
        outbound: mpsc::Sender<ClientMessage>,
    ) -> (Self, SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (events, events_rx) = mpsc::unbounded_channel();

        let controller = Self {
            local_id: None,
            room: None,
            awaiting_approval: None,
            links: LinkTable::new(),
            incoming: Reassembler::new(),
            pending_acks: HashMap::new(),
            connector,
            command_rx,
            server_rx,
            outbound,
            transport_tx,
            transport_rx,
            events,
        };

        (controller, SessionHandle::new(command_tx), events_rx)
    }

    /// Builds a controller and runs it on the current runtime.
    pub fn spawn(
        connector: Arc<dyn Connector>,
        server_rx: mpsc::Receiver<ServerMessage>,
        outbound: mpsc::Sender<ClientMessage>,
    ) -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let (controller, handle, events) = Self::new(connector, server_rx, outbound);
        tokio::spawn(controller.run());
        (handle, events)
    }

    pub async fn run(mut self) {
        info!("Session controller started");
        let mut server_open = true;

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd).await,
                },

                msg = self.server_rx.recv(), if server_open => match msg {
                    Some(msg) => self.handle_server_message(msg).await,
                    None => {
                        warn!("Broker connection closed");
                        server_open = false;
                        self.fail_pending_acks();
                    }
                },

                Some(evt) = self.transport_rx.recv() => {
                    self.handle_transport_event(evt).await;
                }
            }
        }

        self.close_all_links().await;
        self.fail_pending_acks();
        info!("Session controller finished");
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::CreateRoom {
                room_id,
                respond_to,
            } => {
                let req = RequestId::new();
                let msg = ClientMessage::CreateRoom {
                    req,
                    room_id: room_id.clone(),
                };
                match self.send_to_broker(msg).await {
                    Ok(()) => {
                        self.pending_acks.insert(
                            req,
                            PendingAck::Create {
                                room_id,
                                respond_to,
                            },
                        );
                    }
                    Err(e) => {
                        let _ = respond_to.send(Err(e));
                    }
                }
            }

            SessionCommand::JoinRoom {
                room_id,
                respond_to,
            } => {
                let req = RequestId::new();
                let msg = ClientMessage::JoinRequest {
                    req,
                    room_id: room_id.clone(),
                };
                match self.send_to_broker(msg).await {
                    Ok(()) => {
                        self.pending_acks.insert(
                            req,
                            PendingAck::Join {
                                room_id,
                                respond_to,
                            },
                        );
                    }
                    Err(e) => {
                        let _ = respond_to.send(Err(e));
                    }
                }
            }

            SessionCommand::Decide {
                requester_id,
                approve,
                respond_to,
            } => {
                let result = match &self.room {
                    Some(room) if room.is_host => {
                        let msg = ClientMessage::HostResponse {
                            room_id: room.room_id.clone(),
                            requester_id,
                            approved: approve,
                        };
                        self.send_to_broker(msg).await
                    }
                    _ => Err(SessionError::NotInRoom),
                };
                let _ = respond_to.send(result);
            }

            SessionCommand::ShareClipboard {
                content,
                kind,
                respond_to,
            } => {
                let result = match &self.room {
                    Some(room) => {
                        let msg = ClientMessage::ClipboardUpdate {
                            room_id: room.room_id.clone(),
                            content,
                            kind,
                        };
                        self.send_to_broker(msg).await
                    }
                    None => Err(SessionError::NotInRoom),
                };
                let _ = respond_to.send(result);
            }

            SessionCommand::SendPayload {
                name,
                content_type,
                data,
                respond_to,
            } => {
                let targets = self.links.transfer_targets();
                let result = OutgoingTransfer::start(name, content_type, data, targets)
                    .map_err(|_| SessionError::TransferTargetUnavailable);
                let _ = respond_to.send(result);
            }

            SessionCommand::ConnectedPeers { respond_to } => {
                let peers = self.links.connected().iter().map(|h| h.remote).collect();
                let _ = respond_to.send(peers);
            }

            SessionCommand::Shutdown => {}
        }
    }

    async fn handle_server_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Welcome {
                peer_id,
                ice_servers,
            } => {
                info!("Broker assigned id {}", peer_id);
                self.local_id = Some(peer_id);
                self.emit(SessionEvent::Welcomed {
                    peer_id,
                    ice_servers,
                });
            }

            ServerMessage::Ack { req, reply } => self.on_ack(req, reply),

            ServerMessage::UserRequestingJoin {
                room_id,
                requester_id,
            } => {
                info!("{} asks to join {}", requester_id, room_id);
                self.emit(SessionEvent::JoinRequested {
                    room_id,
                    requester_id,
                });
            }

            ServerMessage::JoinApproved { room_id, host_id } => {
                info!("Admitted to {} by {}", room_id, host_id);
                self.awaiting_approval = None;
                self.enter_room(room_id.clone(), Some(host_id), false);
                self.emit(SessionEvent::JoinApproved { room_id, host_id });
                self.open_link(host_id, Role::Initiator).await;
            }

            ServerMessage::JoinDenied { room_id } => {
                info!("Join to {} denied", room_id);
                if self.awaiting_approval.as_ref() == Some(&room_id) {
                    self.awaiting_approval = None;
                }
                self.emit(SessionEvent::JoinDenied { room_id });
            }

            ServerMessage::RoomClosed { room_id } => {
                info!("Room {} closed", room_id);
                self.close_all_links().await;
                self.incoming.clear();
                self.room = None;
                self.emit(SessionEvent::RoomClosed { room_id });
            }

            ServerMessage::Signal {
                sender_id,
                envelope,
            } => self.on_remote_signal(sender_id, envelope).await,

            ServerMessage::ClipboardUpdated {
                content,
                kind,
                sender_id,
            } => self.emit(SessionEvent::ClipboardReceived {
                content,
                kind,
                sender_id,
            }),

            ServerMessage::Error { reason } => {
                warn!("Broker reported: {}", reason);
                self.emit(SessionEvent::ServerError { reason });
            }
        }
    }

    fn on_ack(&mut self, req: RequestId, reply: Reply) {
        let Some(pending) = self.pending_acks.remove(&req) else {
            warn!("Ack for unknown request {:?}", req);
            return;
        };

        match pending {
            PendingAck::Create {
                room_id,
                respond_to,
            } => {
                let result = match reply {
                    Reply::Created => {
                        self.enter_room(room_id, self.local_id, true);
                        Ok(JoinStatus::Joined)
                    }
                    Reply::Failed { reason } => Err(SessionError::Rejected(reason)),
                    other => {
                        warn!("Unexpected reply to create-room: {:?}", other);
                        Err(SessionError::Rejected(ErrorReason::Malformed))
                    }
                };
                let _ = respond_to.send(result);
            }

            PendingAck::Join {
                room_id,
                respond_to,
            } => {
                let result = match reply {
                    Reply::Join {
                        status: JoinStatus::Joined,
                    } => {
                        if self.room.as_ref().map(|r| &r.room_id) != Some(&room_id) {
                            self.enter_room(room_id, None, false);
                        }
                        Ok(JoinStatus::Joined)
                    }
                    Reply::Join {
                        status: JoinStatus::Pending,
                    } => {
                        self.awaiting_approval = Some(room_id);
                        Ok(JoinStatus::Pending)
                    }
                    Reply::Failed { reason } => Err(SessionError::Rejected(reason)),
                    Reply::Created => {
                        warn!("Unexpected created reply to join-request");
                        Err(SessionError::Rejected(ErrorReason::Malformed))
                    }
                };
                let _ = respond_to.send(result);
            }
        }
    }

    fn enter_room(&mut self, room_id: RoomId, host_id: Option<PeerId>, is_host: bool) {
        self.room = Some(RoomState {
            room_id,
            host_id,
            is_host,
        });
    }

    async fn open_link(&mut self, remote: PeerId, role: Role) {
        let admission = self.links.open(remote, role);
        if admission.is_new() {
            self.bring_up(admission.handle(), role).await;
        }
    }

    /// Opens the transport for a freshly registered link.
    async fn bring_up(&mut self, handle: LinkHandle, role: Role) -> Option<Arc<dyn PeerTransport>> {
        match self
            .connector
            .open(handle, role, self.transport_tx.clone())
            .await
        {
            Ok(transport) => {
                self.links.attach(handle, transport.clone());
                Some(transport)
            }
            Err(e) => {
                warn!("Could not open transport for {}: {:#}", handle, e);
                self.links.retire(handle);
                None
            }
        }
    }

    async fn on_remote_signal(&mut self, sender: PeerId, envelope: SignalEnvelope) {
        let opening = envelope.is_opening();
        let admission = match self.links.accept_signal(sender, opening) {
            Ok(admission) => admission,
            Err(e) => {
                debug!("{}", e);
                return;
            }
        };

        let handle = admission.handle();
        let transport = match admission {
            Admission::Existing(handle) => self.links.current(handle).and_then(PeerLink::transport),
            Admission::Created(handle) => self.bring_up(handle, Role::Responder).await,
            Admission::Superseded { handle, retired } => {
                self.teardown(retired).await;
                self.bring_up(handle, Role::Responder).await
            }
        };

        if opening {
            self.links.transition(handle, LinkEvent::Negotiate);
        }
        let Some(transport) = transport else {
            return;
        };
        if let Err(e) = transport.signal(envelope).await {
            warn!("{}", e);
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        let link = event.link();
        if !self.links.is_current(link) {
            debug!("Dropping event from retired link {}", link);
            return;
        }

        match event {
            TransportEvent::Signal { link, envelope } => {
                if envelope.is_opening() {
                    self.links.transition(link, LinkEvent::Negotiate);
                }
                let msg = ClientMessage::Signal {
                    target_id: link.remote,
                    envelope,
                    room_id: self.room.as_ref().map(|r| r.room_id.clone()),
                };
                if let Err(e) = self.send_to_broker(msg).await {
                    warn!("Signal for {} not sent: {}", link, e);
                }
            }

            TransportEvent::Connected { link } => {
                if self.links.mark_connected(link) {
                    info!("Link {} connected", link);
                    self.emit(SessionEvent::PeerConnected {
                        peer_id: link.remote,
                    });
                }
            }

            TransportEvent::Data { link, frame } => {
                match self.incoming.on_frame(link.remote, frame) {
                    Ok(Some(payload)) => {
                        info!(
                            "Received '{}' ({} bytes) from {}",
                            payload.name,
                            payload.data.len(),
                            link.remote
                        );
                        self.emit(SessionEvent::PayloadReceived(payload));
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Frame from {}: {}", link, e),
                }
            }

            TransportEvent::Closed { link } => {
                if let Some(retired) = self.links.retire(link) {
                    info!("Link {} closed", link);
                    self.teardown(retired).await;
                }
            }
        }
    }

    /// Releases everything a removed link held.
    async fn teardown(&mut self, link: PeerLink) {
        let remote = link.remote();
        if self.incoming.discard(&remote) {
            debug!("Discarded partial transfer from {}", remote);
        }
        if let Some(transport) = link.transport() {
            transport.close().await;
        }
        if link.was_connected() {
            self.emit(SessionEvent::PeerDisconnected { peer_id: remote });
        }
    }

    async fn close_all_links(&mut self) {
        for link in self.links.drain() {
            self.teardown(link).await;
        }
    }

    fn fail_pending_acks(&mut self) {
        for (_, pending) in self.pending_acks.drain() {
            let respond_to = match pending {
                PendingAck::Create { respond_to, .. } | PendingAck::Join { respond_to, .. } => {
                    respond_to
                }
            };
            let _ = respond_to.send(Err(SessionError::Closed));
        }
    }

    async fn send_to_broker(&self, msg: ClientMessage) -> Result<(), SessionError> {
        self.outbound
            .send(msg)
            .await
            .map_err(|_| SessionError::Closed)
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("Session event dropped: no listener");
        }
    }
}

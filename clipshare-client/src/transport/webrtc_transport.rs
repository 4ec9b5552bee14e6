use crate::link::{LinkError, LinkHandle, Role};
use crate::transport::{Connector, PeerTransport, TransportConfig, TransportEvent};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use clipshare_core::SignalEnvelope;
use std::sync::Arc;
use tokio::sync::{OnceCell, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

type ChannelSlot = Arc<OnceCell<Arc<RTCDataChannel>>>;

/// Opens [`WebRtcTransport`]s with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct WebRtcConnector {
    config: TransportConfig,
}

impl WebRtcConnector {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for WebRtcConnector {
    async fn open(
        &self,
        link: LinkHandle,
        role: Role,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>> {
        let transport = WebRtcTransport::new(link, &self.config, events).await?;
        if role == Role::Initiator {
            transport.start_offer().await?;
        }
        Ok(Arc::new(transport))
    }
}

/// One RTCPeerConnection with a single ordered data channel.
pub struct WebRtcTransport {
    link: LinkHandle,
    label: String,
    peer_connection: Arc<RTCPeerConnection>,
    channel: ChannelSlot,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl WebRtcTransport {
    pub async fn new(
        link: LinkHandle,
        config: &TransportConfig,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );
        let channel: ChannelSlot = Arc::new(OnceCell::new());

        let state_tx = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    info!("Peer connection {} state: {:?}", link, s);
                    if matches!(
                        s,
                        RTCPeerConnectionState::Failed
                            | RTCPeerConnectionState::Disconnected
                            | RTCPeerConnectionState::Closed
                    ) {
                        let _ = tx.send(TransportEvent::Closed { link });
                    }
                })
            },
        ));

        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let Ok(value) = serde_json::to_value(&init) else {
                    return;
                };
                let _ = tx.send(TransportEvent::Signal {
                    link,
                    envelope: SignalEnvelope::candidate(value),
                });
            })
        }));

        let dc_tx = events.clone();
        let dc_slot = channel.clone();
        peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let tx = dc_tx.clone();
            let slot = dc_slot.clone();
            Box::pin(async move {
                debug!("Remote opened data channel '{}' on {}", dc.label(), link);
                wire_channel(dc, link, tx, slot);
            })
        }));

        Ok(Self {
            link,
            label: config.channel_label.clone(),
            peer_connection,
            channel,
            events,
        })
    }

    /// Creates the data channel and emits the opening offer.
    async fn start_offer(&self) -> Result<()> {
        let dc = self
            .peer_connection
            .create_data_channel(&self.label, None)
            .await
            .context("Failed to create data channel")?;
        wire_channel(dc, self.link, self.events.clone(), self.channel.clone());

        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        self.emit(SignalEnvelope::offer(offer.sdp));
        Ok(())
    }

    fn emit(&self, envelope: SignalEnvelope) {
        let _ = self.events.send(TransportEvent::Signal {
            link: self.link,
            envelope,
        });
    }

    async fn apply(&self, envelope: SignalEnvelope) -> Result<()> {
        match envelope.kind() {
            Some("offer") => {
                let sdp = envelope.sdp().context("offer without sdp")?;
                let desc = RTCSessionDescription::offer(sdp.to_owned())?;
                self.peer_connection.set_remote_description(desc).await?;

                let answer = self.peer_connection.create_answer(None).await?;
                self.peer_connection
                    .set_local_description(answer.clone())
                    .await?;
                self.emit(SignalEnvelope::answer(answer.sdp));
            }
            Some("answer") => {
                let sdp = envelope.sdp().context("answer without sdp")?;
                let desc = RTCSessionDescription::answer(sdp.to_owned())?;
                self.peer_connection.set_remote_description(desc).await?;
            }
            Some("candidate") => {
                let raw = envelope
                    .0
                    .get("candidate")
                    .cloned()
                    .context("candidate envelope without candidate")?;
                let candidate: RTCIceCandidateInit =
                    serde_json::from_value(raw).context("Failed to parse ICE candidate JSON")?;
                self.peer_connection.add_ice_candidate(candidate).await?;
            }
            other => debug!("Ignoring envelope of type {:?} on {}", other, self.link),
        }
        Ok(())
    }
}

/// Reports open and inbound messages of `dc` and stores it for sending.
fn wire_channel(
    dc: Arc<RTCDataChannel>,
    link: LinkHandle,
    events: mpsc::UnboundedSender<TransportEvent>,
    slot: ChannelSlot,
) {
    let open_tx = events.clone();
    let ready = dc.clone();
    dc.on_open(Box::new(move || {
        let tx = open_tx.clone();
        let slot = slot.clone();
        let ready = ready.clone();
        Box::pin(async move {
            info!("Data channel open on {}", link);
            if slot.set(ready).is_err() {
                warn!("Second data channel on {} ignored", link);
                return;
            }
            let _ = tx.send(TransportEvent::Connected { link });
        })
    }));

    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let tx = events.clone();
        Box::pin(async move {
            let _ = tx.send(TransportEvent::Data {
                link,
                frame: msg.data,
            });
        })
    }));
}

#[async_trait]
impl PeerTransport for WebRtcTransport {
    async fn signal(&self, envelope: SignalEnvelope) -> Result<(), LinkError> {
        self.apply(envelope)
            .await
            .map_err(|e| LinkError::transport(self.link.remote, format!("{:#}", e)))
    }

    async fn send(&self, frame: Bytes) -> Result<(), LinkError> {
        let Some(dc) = self.channel.get() else {
            return Err(LinkError::transport(self.link.remote, "data channel not open"));
        };
        dc.send(&frame)
            .await
            .map(|_| ())
            .map_err(|e| LinkError::transport(self.link.remote, e))
    }

    async fn close(&self) {
        if let Err(e) = self.peer_connection.close().await {
            warn!("Closing peer connection {} failed: {}", self.link, e);
        }
    }
}

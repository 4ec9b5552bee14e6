mod peer_transport;
mod transport_config;
mod transport_event;
#[cfg(feature = "webrtc")]
mod webrtc_transport;

pub use peer_transport::*;
pub use transport_config::*;
pub use transport_event::*;
#[cfg(feature = "webrtc")]
pub use webrtc_transport::*;

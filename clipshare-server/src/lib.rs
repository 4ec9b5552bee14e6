//! Room broker: host-gated room membership and a signaling relay, served over WebSocket.

pub mod app;
pub mod config;
pub mod room;
pub mod signaling;

pub use app::{router, serve, serve_on, start_hub};
pub use config::{ConfigError, ServerConfig};
pub use room::*;
pub use signaling::*;

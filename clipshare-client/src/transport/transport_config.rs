use clipshare_core::IceServerConfig;
use clipshare_core::utils::default_ice_servers;

/// Connection settings handed to transports.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
    /// Label of the data channel an initiator creates.
    pub channel_label: String,
}

impl TransportConfig {
    /// Uses the servers the broker announced in its welcome, falling back
    /// to the public defaults when it announced none.
    pub fn from_welcome(ice_servers: Vec<IceServerConfig>) -> Self {
        if ice_servers.is_empty() {
            return Self::default();
        }
        Self {
            ice_servers,
            ..Self::default()
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: default_ice_servers(),
            channel_label: "clipshare".to_owned(),
        }
    }
}

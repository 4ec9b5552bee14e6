pub use clipshare_core::model::{PeerId, RoomId};

pub mod model {
    pub use clipshare_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use clipshare_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use clipshare_client::*;
}

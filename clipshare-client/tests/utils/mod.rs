pub mod memory_broker;
pub mod memory_transport;
pub mod scripted_transport;
pub mod test_peer;

pub use memory_broker::*;
pub use memory_transport::*;
pub use scripted_transport::*;
pub use test_peer::*;

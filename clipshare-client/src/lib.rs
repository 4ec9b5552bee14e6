pub mod link;
pub mod session;
pub mod transfer;
pub mod transport;

pub use link::*;
pub use session::*;
pub use transfer::*;
pub use transport::*;

mod frame;
mod incoming;
mod outgoing;
mod transfer_error;

pub use frame::*;
pub use incoming::*;
pub use outgoing::*;
pub use transfer_error::*;

mod link_error;
mod link_state;
mod link_table;
mod peer_link;

pub use link_error::*;
pub use link_state::*;
pub use link_table::*;
pub use peer_link::*;

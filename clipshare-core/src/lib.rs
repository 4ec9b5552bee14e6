//! Wire model shared by the clipshare broker and its clients.

pub mod model;
pub mod utils;

pub use model::*;

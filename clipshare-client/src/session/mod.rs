mod session_command;
mod session_controller;
mod session_error;
mod session_event;
mod session_handle;

pub use session_command::*;
pub use session_controller::*;
pub use session_error::*;
pub use session_event::*;
pub use session_handle::*;

mod author;
mod command;
mod error;
mod event;
mod generation_client;
mod message;
mod preview_transport;
mod session_state;
mod version;

pub use author::*;
pub use command::*;
pub use error::*;
pub use event::*;
pub use generation_client::*;
pub use message::*;
pub use preview_transport::*;
pub use session_state::*;
pub use version::*;

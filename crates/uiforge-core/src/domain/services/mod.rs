pub mod code_transformer;
mod preview_sync;
mod session_controller;
mod version_store;

pub use preview_sync::*;
pub use session_controller::*;
pub use version_store::*;

//! Generation session engine for uiforge.
//!
//! A user describes an interface in natural language, a remote service
//! generates the source, and this crate keeps the conversation, the numbered
//! code history and the external preview renderer consistent with each other.
//! Hosts drive a [`SessionController`] through commands and observe immutable
//! [`SessionState`] snapshots.

pub mod configuration;
pub mod domain;
pub mod infrastructure;

pub use configuration::{Config, ConfigKey, SessionSettings};
pub use domain::models::{
    Author, BackendName, Command, GenerationClient, GenerationError, Message, MessageKind,
    PreviewSyncError, PreviewTransport, SessionError, SessionState, Version,
};
pub use domain::services::code_transformer;
pub use domain::services::{
    PreviewStatus, PreviewSync, SessionController, SessionHandle, SessionProps, VersionStore,
};

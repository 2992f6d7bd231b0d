//! Configuration management for the session engine.
//!
//! `Config` is the process wide string store filled from defaults, the TOML
//! config file and the command line. `SessionSettings` is its typed view.

mod config;
mod settings;

pub use config::*;
pub use settings::*;

//! Core domain logic for the generation session engine.
//!
//! This module contains the session state machine and the data models it works
//! on, independent of the HTTP backends and the host that drives it.

pub mod models;
pub mod services;
